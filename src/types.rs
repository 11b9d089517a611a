/// Unique record identifier (stable across calls).
/// Example: `npi::1234567890`
pub type RecordId = String;
/// Name of a record field.
/// Examples: `tier_raw`, `growth_probability`, `ngd_decile`
pub type FieldName = String;
/// Group key for a secondary sampling dimension.
/// Examples: `Gold`, `CARDIOLOGY`, `TX-04`
pub type GroupKey = String;
