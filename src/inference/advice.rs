//! Recommendations shown next to a prediction

use super::RiskBand;

const HIGH_RISK_ADVICE: [&str; 5] = [
    "Seek professional psychological counseling",
    "Adjust workload intensity and working hours",
    "Strengthen physical exercise and health management",
    "Improve sleep quality and eating habits",
    "Consider discussing work pressure with your supervisor",
];

const MEDIUM_RISK_ADVICE: [&str; 5] = [
    "Practice stress management regularly",
    "Keep a balance between work and life",
    "Build positive coping strategies",
    "Watch for physical warning signs and adjust early",
    "Strengthen social support and family communication",
];

const LOW_RISK_ADVICE: [&str; 5] = [
    "Keep up a healthy lifestyle",
    "Assess your stress level periodically",
    "Cultivate a positive mindset and emotional management",
    "Balance work and rest time",
    "Keep monitoring physical and mental health indicators",
];

/// Recommendation list for a risk band
pub fn recommendations(band: RiskBand) -> &'static [&'static str] {
    match band {
        RiskBand::High => &HIGH_RISK_ADVICE,
        RiskBand::Medium => &MEDIUM_RISK_ADVICE,
        RiskBand::Low => &LOW_RISK_ADVICE,
    }
}
