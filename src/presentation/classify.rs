use crate::types::SeverityTier;

// Statuses the analysis service is known to emit. Anything else is informational.
const STATUS_TIERS: &[(&str, SeverityTier)] = &[
    ("critical", SeverityTier::Critical),
    ("warning", SeverityTier::Warning),
    ("attention_needed", SeverityTier::Warning),
];

/// Map a metric status or an overall status to its severity tier.
///
/// Total: unknown values fall back to [`SeverityTier::Normal`].
pub fn classify(status: &str) -> SeverityTier {
    STATUS_TIERS
        .iter()
        .find(|(name, _)| *name == status)
        .map(|(_, tier)| *tier)
        .unwrap_or(SeverityTier::Normal)
}
