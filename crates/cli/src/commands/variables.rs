use landed_core::{variables, VariableKey, VariableScope, VariableValue};

pub fn run() -> String {
    let mut lines =
        vec!["calculation variables (precedence: product override > quote default > admin setting > fallback):".to_string()];

    for key in VariableKey::ALL {
        let spec = variables::spec(key);
        let scope = match spec.scope {
            VariableScope::Product => "product",
            VariableScope::Quote => "quote",
            VariableScope::Both => "product|quote",
            VariableScope::Admin => "admin-only",
        };
        let requirement = if spec.required { "required" } else { "optional" };
        let fallback = match &spec.fallback {
            Some(VariableValue::Number(value)) => format!("fallback {value}"),
            Some(VariableValue::Money(money)) => format!("fallback {money}"),
            Some(VariableValue::Count(value)) => format!("fallback {value}"),
            Some(VariableValue::Text(value)) => format!("fallback `{value}`"),
            None => "no fallback".to_string(),
        };
        lines.push(format!("  {key:<26} {scope:<14} {requirement:<9} {fallback}"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn lists_every_variable_with_scope() {
        let output = run();
        assert!(output.contains("rate_forex_risk"));
        assert!(output.contains("admin-only"));
        assert!(output.contains("markup_pct"));
        // header plus one line per registry entry
        assert_eq!(output.lines().count(), 36);
    }
}
