use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_key: String,
    pub scenario_name: String,
    pub passed: bool,
    pub failure: Option<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl ScenarioResult {
    pub fn from_outcome(
        key: &str,
        name: &str,
        outcome: &Result<()>,
        duration: Duration,
    ) -> Self {
        Self {
            scenario_key: key.to_string(),
            scenario_name: name.to_string(),
            passed: outcome.is_ok(),
            failure: outcome.as_ref().err().map(|err| format!("{err:#}")),
            duration,
        }
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Tour Scenario Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "========================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = total - passed;

    writeln!(out, "Total scenarios: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", failed.to_string().red())?;
    if total > 0 {
        #[allow(clippy::cast_precision_loss)]
        let success_rate = (passed as f64 / total as f64) * 100.0;
        writeln!(out, "Success rate: {success_rate:.1}%")?;
    }
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{status} {} ({})",
            result.scenario_name.bold(),
            result.scenario_key
        )?;
        writeln!(out, "   Time: {:?}", result.duration)?;
        if let Some(failure) = &result.failure {
            writeln!(out, "   • {}", failure.red())?;
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json}")?;
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ScenarioResult> {
        vec![
            ScenarioResult::from_outcome(
                "autostart",
                "Auto-start",
                &Ok(()),
                Duration::from_millis(12),
            ),
            ScenarioResult::from_outcome(
                "hooks",
                "Hooks",
                &Err(anyhow::anyhow!("unexpected hook order")),
                Duration::from_millis(30),
            ),
        ]
    }

    #[test]
    fn json_report_round_trips_with_millisecond_durations() {
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &sample()).expect("json report");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("\"duration\": 30"));
        let parsed: Vec<ScenarioResult> = serde_json::from_str(&text).expect("parse back");
        assert_eq!(parsed, sample());
    }

    #[test]
    fn console_report_lists_failures() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &sample(), Duration::from_millis(42))
            .expect("console report");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Total scenarios: 2"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("❌ FAIL Hooks (hooks)"));
        assert!(text.contains("unexpected hook order"));
    }
}
