// ── Per-model feature support matrix ──
//
// Older/cheaper models lack entire subsystems; probing them wastes a
// round trip per poll. Entries are unsupported path prefixes -- a bare
// module name blocks the whole module, `module|field` blocks one field.
// Unknown models fall back to the permissive `"default"` entry, while
// explicitly known limited models get restrictive lists. That asymmetry
// is a deliberate policy, not an accident.

/// Unsupported path prefixes per hardware model.
const FEATURES_NOT_IMPLEMENTED: &[(&str, &[&str])] = &[
    ("default", &[]),
    // WiFi-only router: no cellular modem, so no modem stats, no
    // cellular data counters, no SMS.
    ("WR3000S V1.0", &["modem", "data_usage", "sms"]),
];

/// Whether `path` (a module name, or `module|field`) should be attempted
/// for the given hardware model.
pub fn is_supported(device_model: &str, path: &str) -> bool {
    let unsupported = FEATURES_NOT_IMPLEMENTED
        .iter()
        .find(|(model, _)| *model == device_model)
        .or_else(|| {
            FEATURES_NOT_IMPLEMENTED
                .iter()
                .find(|(model, _)| *model == "default")
        })
        .map_or(&[] as &[&str], |(_, prefixes)| prefixes);

    !unsupported
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}|")))
}
