use serde::{Deserialize, Serialize};

/// Named scalar inputs handed to the coordinator.
pub type CrewInputs = serde_json::Map<String, serde_json::Value>;

/// Inputs of the financial trading pipeline. Values are passed through
/// untouched; nothing here parses the capital or the tolerance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinancialTradingInputs {
    pub stock_selection: String,
    pub initial_capital: String,
    pub risk_tolerance: String,
    pub trading_strategy_preference: String,
    pub news_impact_consideration: bool,
}

impl FinancialTradingInputs {
    /// Build the inputs from the four caller-supplied values. News impact is
    /// always considered.
    pub fn new(
        stock_selection: &str,
        initial_capital: &str,
        risk_tolerance: &str,
        trading_strategy_preference: &str,
    ) -> Self {
        Self {
            stock_selection: stock_selection.to_string(),
            initial_capital: initial_capital.to_string(),
            risk_tolerance: risk_tolerance.to_string(),
            trading_strategy_preference: trading_strategy_preference.to_string(),
            news_impact_consideration: true,
        }
    }

    pub fn to_crew_inputs(&self) -> CrewInputs {
        let mut inputs = CrewInputs::new();
        inputs.insert("stock_selection".into(), self.stock_selection.clone().into());
        inputs.insert("initial_capital".into(), self.initial_capital.clone().into());
        inputs.insert("risk_tolerance".into(), self.risk_tolerance.clone().into());
        inputs.insert(
            "trading_strategy_preference".into(),
            self.trading_strategy_preference.clone().into(),
        );
        inputs.insert(
            "news_impact_consideration".into(),
            self.news_impact_consideration.into(),
        );
        inputs
    }
}

/// Render an input value the way it is spliced into prompt text.
pub fn render_input(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn crew_inputs_hold_exactly_five_fields() {
        let inputs = FinancialTradingInputs::new("AAPL", "100000", "Medium", "Day Trading");
        let map = inputs.to_crew_inputs();

        assert_eq!(map.len(), 5);
        assert_eq!(map["stock_selection"], json!("AAPL"));
        assert_eq!(map["initial_capital"], json!("100000"));
        assert_eq!(map["risk_tolerance"], json!("Medium"));
        assert_eq!(map["trading_strategy_preference"], json!("Day Trading"));
        assert_eq!(map["news_impact_consideration"], json!(true));
    }

    #[test]
    fn crew_inputs_match_serde_shape() {
        let inputs = FinancialTradingInputs::new("TSLA", "5000", "High", "Swing Trading");
        let via_serde = serde_json::to_value(&inputs).unwrap();
        assert_eq!(serde_json::Value::Object(inputs.to_crew_inputs()), via_serde);
    }

    #[test]
    fn render_input_strips_string_quotes() {
        assert_eq!(render_input(&json!("AAPL")), "AAPL");
        assert_eq!(render_input(&json!(true)), "true");
        assert_eq!(render_input(&json!(42)), "42");
        assert_eq!(render_input(&serde_json::Value::Null), "");
    }
}
