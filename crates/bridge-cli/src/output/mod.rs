use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn raw_is_single_line() {
        let value = json!({"local_id": "pln-1", "remote_id": 7});
        assert_eq!(
            render(&value, OutputFormat::Raw).unwrap(),
            r#"{"local_id":"pln-1","remote_id":7}"#
        );
        assert!(render(&value, OutputFormat::Json).unwrap().contains('\n'));
    }
}
