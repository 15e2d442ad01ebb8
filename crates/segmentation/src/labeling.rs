//! Threshold rules that turn cluster mean RFM values into segment labels.

use shopper_core::config::LabelThresholds;
use shopper_core::types::SegmentLabel;

/// Mean RFM values of one cluster, on the original (unscaled) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfmMeans {
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
}

/// Ordered labeling rules; the first rule that matches wins.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRules {
    thresholds: LabelThresholds,
}

impl Default for SegmentRules {
    fn default() -> Self {
        Self::new(LabelThresholds::default())
    }
}

impl From<&LabelThresholds> for SegmentRules {
    fn from(thresholds: &LabelThresholds) -> Self {
        Self::new(thresholds.clone())
    }
}

impl SegmentRules {
    pub fn new(thresholds: LabelThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &LabelThresholds {
        &self.thresholds
    }

    pub fn label(&self, means: &RfmMeans) -> SegmentLabel {
        let t = &self.thresholds;
        if means.recency < t.high_value_max_recency
            && means.frequency > t.high_value_min_frequency
            && means.monetary > t.high_value_min_monetary
        {
            SegmentLabel::HighValue
        } else if means.recency < t.regular_max_recency
            && means.frequency > t.regular_min_frequency
        {
            SegmentLabel::Regular
        } else if means.recency > t.at_risk_min_recency
            && means.frequency <= t.at_risk_max_frequency
        {
            SegmentLabel::AtRisk
        } else {
            SegmentLabel::Occasional
        }
    }
}
