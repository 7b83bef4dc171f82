// src/models/lenient.rs

// Leitura tolerante dos documentos embutidos.
// Os arrays do tenant chegam de várias versões do CRUD, então datas e números
// podem vir como string, número, ou no formato estendido ({"$date": ...}).

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Converte um valor JSON qualquer em instante UTC.
/// Retorna `None` quando o valor não é uma data reconhecível.
pub fn parse_datetime_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_datetime_str(raw),
        // Epoch em milissegundos (formato de exportação do banco antigo)
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(map) => map.get("$date").and_then(parse_datetime_value),
        _ => None,
    }
}

pub fn parse_datetime_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // ISO sem fuso é tratado como UTC
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `deserialize_with` para datas opcionais: data inválida vira `None`, nunca erro.
pub fn optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_datetime_value))
}

/// `deserialize_with` para quantidades inteiras gravadas como 5, 5.0 ou "5".
pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
        Some(_) => None,
    };

    parsed.ok_or_else(|| serde::de::Error::custom("quantidade inválida"))
}

/// Valor monetário em qualquer formato conhecido; `None` se não for um número.
pub fn parse_decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal_str(&n.to_string()),
        Value::String(raw) => parse_decimal_str(raw),
        // Exportação estendida: {"$numberDecimal": "12.50"}
        Value::Object(map) => map.get("$numberDecimal").and_then(parse_decimal_value),
        _ => None,
    }
}

fn parse_decimal_str(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// `deserialize_with` para preços e totais: null ou valor ilegível vira 0,
/// para que um registro ruim não impeça a leitura do array inteiro.
pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(parse_decimal_value)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};
    use serde_json::json;

    #[test]
    fn parses_the_formats_found_in_stored_sales() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap();

        assert_eq!(parse_datetime_str("2025-03-14T10:30:00Z"), Some(expected));
        assert_eq!(parse_datetime_str("2025-03-14T07:30:00-03:00"), Some(expected));
        assert_eq!(parse_datetime_str("2025-03-14T10:30:00"), Some(expected));
        assert_eq!(parse_datetime_str("2025-03-14 10:30:00"), Some(expected));
        assert_eq!(
            parse_datetime_value(&json!({ "$date": "2025-03-14T10:30:00Z" })),
            Some(expected)
        );
        assert_eq!(
            parse_datetime_value(&json!(expected.timestamp_millis())),
            Some(expected)
        );

        let date_only = parse_datetime_str("2025-03-14").unwrap();
        assert_eq!((date_only.day(), date_only.hour()), (14, 0));
    }

    #[test]
    fn money_values_in_every_stored_shape() {
        assert_eq!(parse_decimal_value(&json!(119.8)), Some(Decimal::new(1198, 1)));
        assert_eq!(parse_decimal_value(&json!(42)), Some(Decimal::from(42)));
        assert_eq!(parse_decimal_value(&json!(" 59.90 ")), Some(Decimal::new(5990, 2)));
        assert_eq!(parse_decimal_value(&json!("1e3")), Some(Decimal::from(1000)));
        assert_eq!(
            parse_decimal_value(&json!({ "$numberDecimal": "12.50" })),
            Some(Decimal::new(1250, 2))
        );
        assert_eq!(parse_decimal_value(&json!("R$ 10")), None);
        assert_eq!(parse_decimal_value(&json!(1e300)), None);
        assert_eq!(parse_decimal_value(&json!(null)), None);
    }

    #[test]
    fn garbage_dates_become_none() {
        assert_eq!(parse_datetime_str("ontem à tarde"), None);
        assert_eq!(parse_datetime_str(""), None);
        assert_eq!(parse_datetime_value(&json!(true)), None);
    }
}
