#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    Linear,
    /// Quadratic-power out curve in the `power2.out` naming: `1 - (1 - t)^3`
    Power2Out,
    /// `min(1, 1.001 - 2^(-10t))`, the smooth-scroll default
    ExpoOut,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power2Out => 1.0 - (1.0 - t).powi(3),
            Self::ExpoOut => (1.001 - 2f64.powf(-10.0 * t)).min(1.0),
        }
    }
}
