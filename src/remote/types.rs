use serde::{Deserialize, Serialize};

/// A mission stage as served by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub commands: Vec<String>,
}

/// Local command output sent back for grading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub id: String,
    pub results: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandVerdict {
    pub command: String,
    pub is_correct: bool,
}

/// Grading returned by `validate` and `submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub commands: Vec<CommandVerdict>,
    pub is_valid: bool,
    pub percentage_correct: f64,
    pub required_correct_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_uses_camel_case_fields() {
        let report: ValidationReport = serde_json::from_str(
            r#"{"commands":[{"command":"ls","isCorrect":true}],
                "isValid":false,"percentageCorrect":50,"requiredCorrectPercentage":80}"#,
        )
        .unwrap();
        assert_eq!(report.commands[0].command, "ls");
        assert!(report.commands[0].is_correct);
        assert!(!report.is_valid);
        assert_eq!(report.percentage_correct, 50.0);
        assert_eq!(report.required_correct_percentage, 80.0);
    }

    #[test]
    fn report_without_commands_array_is_rejected() {
        let err = serde_json::from_str::<ValidationReport>(
            r#"{"commands":"nope","isValid":true,"percentageCorrect":1,"requiredCorrectPercentage":1}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn mission_tolerates_missing_metadata() {
        let mission: Mission = serde_json::from_str(r#"{"id":"m1","commands":["pwd"]}"#).unwrap();
        assert_eq!(mission.commands, vec!["pwd".to_string()]);
        assert!(mission.title.is_empty());
    }
}
