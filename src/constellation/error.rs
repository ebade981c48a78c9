use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConstellationError {
    /// Every hour in the window was unavailable, or no track accumulated the
    /// minimum number of samples. Distinct from a normal empty result: it
    /// means the upstream feed is down, not that the sky is quiet.
    #[error("no usable snapshot data in the 24-hour window")]
    NoData,
}
