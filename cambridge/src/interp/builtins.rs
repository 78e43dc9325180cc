//! Built-in function library

use super::error::{InterpResult, RuntimeError};
use super::files::FileTable;
use super::value::{Builtin, Value, format_real};
use chrono::{Datelike, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Host state builtins may touch
pub struct HostContext {
    pub files: FileTable,
    pub rng: StdRng,
}

impl HostContext {
    /// A fixed `seed` makes RAND and RANDOM reproducible
    pub fn new(seed: Option<u64>) -> Self {
        HostContext {
            files: FileTable::new(),
            rng: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        }
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Every builtin, keyed by its upper-case name
pub const BUILTINS: &[Builtin] = &[
    Builtin { name: "LENGTH", func: builtin_length },
    Builtin { name: "LEFT", func: builtin_left },
    Builtin { name: "RIGHT", func: builtin_right },
    Builtin { name: "MID", func: builtin_mid },
    Builtin { name: "LCASE", func: builtin_lcase },
    Builtin { name: "UCASE", func: builtin_ucase },
    Builtin { name: "TO_UPPER", func: builtin_to_upper },
    Builtin { name: "TO_LOWER", func: builtin_to_lower },
    Builtin { name: "ASC", func: builtin_asc },
    Builtin { name: "CHR", func: builtin_chr },
    Builtin { name: "INT", func: builtin_int },
    Builtin { name: "RAND", func: builtin_rand },
    Builtin { name: "RANDOM", func: builtin_random },
    Builtin { name: "ROUND", func: builtin_round },
    Builtin { name: "ABS", func: builtin_abs },
    Builtin { name: "SQRT", func: builtin_sqrt },
    Builtin { name: "POW", func: builtin_pow },
    Builtin { name: "NUM_TO_STR", func: builtin_num_to_str },
    Builtin { name: "STR_TO_NUM", func: builtin_str_to_num },
    Builtin { name: "IS_NUM", func: builtin_is_num },
    Builtin { name: "DAY", func: builtin_day },
    Builtin { name: "MONTH", func: builtin_month },
    Builtin { name: "YEAR", func: builtin_year },
    Builtin { name: "DAYINDEX", func: builtin_dayindex },
    Builtin { name: "SETDATE", func: builtin_setdate },
    Builtin { name: "NOW", func: builtin_now },
    Builtin { name: "TODAY", func: builtin_now },
    Builtin { name: "EOF", func: builtin_eof },
];

/// Signature and one-line description, shown by editor hover
pub const BUILTIN_DOCS: &[(&str, &str, &str)] = &[
    ("LENGTH", "LENGTH(s : STRING) RETURNS INTEGER", "Number of characters in s"),
    ("LEFT", "LEFT(s : STRING, n : INTEGER) RETURNS STRING", "First n characters of s"),
    ("RIGHT", "RIGHT(s : STRING, n : INTEGER) RETURNS STRING", "Last n characters of s"),
    ("MID", "MID(s : STRING, start : INTEGER, n : INTEGER) RETURNS STRING", "n characters of s from position start (1-based)"),
    ("LCASE", "LCASE(c : CHAR) RETURNS CHAR", "Lower-case a character or string"),
    ("UCASE", "UCASE(c : CHAR) RETURNS CHAR", "Upper-case a character or string"),
    ("TO_UPPER", "TO_UPPER(s : STRING) RETURNS STRING", "Upper-case s"),
    ("TO_LOWER", "TO_LOWER(s : STRING) RETURNS STRING", "Lower-case s"),
    ("ASC", "ASC(c : CHAR) RETURNS INTEGER", "Character code of c"),
    ("CHR", "CHR(n : INTEGER) RETURNS CHAR", "Character with code n"),
    ("INT", "INT(x : REAL) RETURNS INTEGER", "Integer part of x"),
    ("RAND", "RAND(x : INTEGER) RETURNS REAL", "Random real in [0, x)"),
    ("RANDOM", "RANDOM() RETURNS REAL", "Random real in [0, 1)"),
    ("ROUND", "ROUND(x : REAL, places : INTEGER) RETURNS REAL", "x rounded to places decimal places"),
    ("ABS", "ABS(x : REAL) RETURNS REAL", "Absolute value"),
    ("SQRT", "SQRT(x : REAL) RETURNS REAL", "Square root"),
    ("POW", "POW(base : REAL, exponent : REAL) RETURNS REAL", "base raised to exponent"),
    ("NUM_TO_STR", "NUM_TO_STR(x : REAL) RETURNS STRING", "Number rendered as text"),
    ("STR_TO_NUM", "STR_TO_NUM(s : STRING) RETURNS REAL", "Text parsed as INTEGER or REAL"),
    ("IS_NUM", "IS_NUM(s : STRING) RETURNS BOOLEAN", "TRUE when s parses as a number"),
    ("DAY", "DAY(d : DATE) RETURNS INTEGER", "Day of the month"),
    ("MONTH", "MONTH(d : DATE) RETURNS INTEGER", "Month number"),
    ("YEAR", "YEAR(d : DATE) RETURNS INTEGER", "Year"),
    ("DAYINDEX", "DAYINDEX(d : DATE) RETURNS INTEGER", "Day of the week, Sunday = 1"),
    ("SETDATE", "SETDATE(day : INTEGER, month : INTEGER, year : INTEGER) RETURNS DATE", "Build a date"),
    ("NOW", "NOW() RETURNS DATE", "Today's date"),
    ("TODAY", "TODAY() RETURNS DATE", "Today's date"),
    ("EOF", "EOF(filename : STRING) RETURNS BOOLEAN", "TRUE when no lines remain in an open file"),
];

/// Look up a builtin by name
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

// ============ Argument helpers ============

fn expect_arity(name: &str, args: &[Value], expected: usize) -> InterpResult<()> {
    if args.len() != expected {
        return Err(RuntimeError::arity_mismatch(name, expected, args.len()));
    }
    Ok(())
}

fn wrong_type(name: &str, expected: &str, got: &Value) -> RuntimeError {
    RuntimeError::type_mismatch(format!(
        "{name}: expected {expected}, got {}",
        got.type_name()
    ))
}

fn string_arg<'a>(name: &str, value: &'a Value) -> InterpResult<&'a str> {
    value.as_str().ok_or_else(|| wrong_type(name, "STRING", value))
}

fn int_arg(name: &str, value: &Value) -> InterpResult<i64> {
    value.as_int().ok_or_else(|| wrong_type(name, "INTEGER", value))
}

fn real_arg(name: &str, value: &Value) -> InterpResult<f64> {
    value.as_real().ok_or_else(|| wrong_type(name, "INTEGER or REAL", value))
}

fn date_arg(name: &str, value: &Value) -> InterpResult<NaiveDate> {
    match value {
        Value::Date(d) => Ok(*d),
        other => Err(wrong_type(name, "DATE", other)),
    }
}

fn non_negative(name: &str, n: i64) -> InterpResult<usize> {
    usize::try_from(n).map_err(|_| RuntimeError::domain_error(name, "length must not be negative"))
}

// ============ String Functions ============

fn builtin_length(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("LENGTH", args, 1)?;
    let s = string_arg("LENGTH", &args[0])?;
    Ok(Value::Integer(s.chars().count() as i64))
}

fn builtin_left(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("LEFT", args, 2)?;
    let s = string_arg("LEFT", &args[0])?;
    let n = non_negative("LEFT", int_arg("LEFT", &args[1])?)?;
    Ok(Value::String(s.chars().take(n).collect()))
}

fn builtin_right(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("RIGHT", args, 2)?;
    let s = string_arg("RIGHT", &args[0])?;
    let n = non_negative("RIGHT", int_arg("RIGHT", &args[1])?)?;
    let len = s.chars().count();
    Ok(Value::String(s.chars().skip(len.saturating_sub(n)).collect()))
}

fn builtin_mid(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("MID", args, 3)?;
    let s = string_arg("MID", &args[0])?;
    let start = int_arg("MID", &args[1])?;
    if start < 1 {
        return Err(RuntimeError::domain_error("MID", "start position must be at least 1"));
    }
    let n = non_negative("MID", int_arg("MID", &args[2])?)?;
    let skip = usize::try_from(start - 1).unwrap_or(usize::MAX);
    Ok(Value::String(s.chars().skip(skip).take(n).collect()))
}

fn map_case(name: &str, args: &[Value], upper: bool) -> InterpResult<Value> {
    expect_arity(name, args, 1)?;
    match &args[0] {
        Value::Char(c) if upper => Ok(Value::Char(c.to_ascii_uppercase())),
        Value::Char(c) => Ok(Value::Char(c.to_ascii_lowercase())),
        Value::String(s) if upper => Ok(Value::String(s.to_uppercase())),
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        other => Err(wrong_type(name, "CHAR or STRING", other)),
    }
}

fn builtin_lcase(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    map_case("LCASE", args, false)
}

fn builtin_ucase(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    map_case("UCASE", args, true)
}

fn builtin_to_upper(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    map_case("TO_UPPER", args, true)
}

fn builtin_to_lower(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    map_case("TO_LOWER", args, false)
}

// ============ Character Functions ============

fn builtin_asc(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("ASC", args, 1)?;
    let c = match &args[0] {
        Value::Char(c) => *c,
        Value::String(s) => s
            .chars()
            .next()
            .ok_or_else(|| RuntimeError::domain_error("ASC", "empty string"))?,
        other => return Err(wrong_type("ASC", "CHAR", other)),
    };
    Ok(Value::Integer(c as i64))
}

fn builtin_chr(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("CHR", args, 1)?;
    let code = int_arg("CHR", &args[0])?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(Value::Char)
        .ok_or_else(|| RuntimeError::domain_error("CHR", &format!("invalid character code {code}")))
}

// ============ Numeric Functions ============

fn builtin_int(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("INT", args, 1)?;
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Real(x) => Ok(Value::Integer(x.trunc() as i64)),
        other => Err(wrong_type("INT", "REAL", other)),
    }
}

fn builtin_rand(host: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("RAND", args, 1)?;
    let upper = real_arg("RAND", &args[0])?;
    if upper <= 0.0 {
        return Err(RuntimeError::domain_error("RAND", "upper bound must be positive"));
    }
    Ok(Value::Real(host.rng.r#gen::<f64>() * upper))
}

fn builtin_random(host: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("RANDOM", args, 0)?;
    Ok(Value::Real(host.rng.r#gen::<f64>()))
}

fn builtin_round(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("ROUND", args, 2)?;
    let x = real_arg("ROUND", &args[0])?;
    let places = int_arg("ROUND", &args[1])?;
    let places = i32::try_from(places)
        .ok()
        .filter(|p| (0..=15).contains(p))
        .ok_or_else(|| RuntimeError::domain_error("ROUND", "places must be between 0 and 15"))?;
    let scale = 10f64.powi(places);
    Ok(Value::Real((x * scale).round() / scale))
}

fn builtin_abs(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("ABS", args, 1)?;
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(n.wrapping_abs())),
        Value::Real(x) => Ok(Value::Real(x.abs())),
        other => Err(wrong_type("ABS", "INTEGER or REAL", other)),
    }
}

fn builtin_sqrt(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("SQRT", args, 1)?;
    let x = real_arg("SQRT", &args[0])?;
    if x < 0.0 {
        return Err(RuntimeError::domain_error("SQRT", "negative argument"));
    }
    Ok(Value::Real(x.sqrt()))
}

fn builtin_pow(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("POW", args, 2)?;
    let base = real_arg("POW", &args[0])?;
    let exponent = real_arg("POW", &args[1])?;
    Ok(Value::Real(base.powf(exponent)))
}

// ============ Conversion Functions ============

fn builtin_num_to_str(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("NUM_TO_STR", args, 1)?;
    match &args[0] {
        Value::Integer(n) => Ok(Value::String(n.to_string())),
        Value::Real(x) => Ok(Value::String(format_real(*x))),
        other => Err(wrong_type("NUM_TO_STR", "INTEGER or REAL", other)),
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Integer(n));
    }
    text.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(Value::Real)
}

fn builtin_str_to_num(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("STR_TO_NUM", args, 1)?;
    let s = string_arg("STR_TO_NUM", &args[0])?;
    parse_number(s)
        .ok_or_else(|| RuntimeError::domain_error("STR_TO_NUM", &format!("invalid number: {s}")))
}

fn builtin_is_num(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("IS_NUM", args, 1)?;
    let s = string_arg("IS_NUM", &args[0])?;
    Ok(Value::Boolean(parse_number(s).is_some()))
}

// ============ Date Functions ============

fn builtin_day(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("DAY", args, 1)?;
    Ok(Value::Integer(date_arg("DAY", &args[0])?.day() as i64))
}

fn builtin_month(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("MONTH", args, 1)?;
    Ok(Value::Integer(date_arg("MONTH", &args[0])?.month() as i64))
}

fn builtin_year(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("YEAR", args, 1)?;
    Ok(Value::Integer(date_arg("YEAR", &args[0])?.year() as i64))
}

fn builtin_dayindex(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("DAYINDEX", args, 1)?;
    let date = date_arg("DAYINDEX", &args[0])?;
    Ok(Value::Integer(date.weekday().number_from_sunday() as i64))
}

fn builtin_setdate(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("SETDATE", args, 3)?;
    let day = int_arg("SETDATE", &args[0])?;
    let month = int_arg("SETDATE", &args[1])?;
    let year = int_arg("SETDATE", &args[2])?;
    let date = match (i32::try_from(year), u32::try_from(month), u32::try_from(day)) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    };
    date.map(Value::Date).ok_or_else(|| {
        RuntimeError::domain_error(
            "SETDATE",
            &format!("invalid date {day:02}/{month:02}/{year:04}"),
        )
    })
}

fn builtin_now(_: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("NOW", args, 0)?;
    Ok(Value::Date(Local::now().date_naive()))
}

// ============ File Functions ============

fn builtin_eof(host: &mut HostContext, args: &[Value]) -> InterpResult<Value> {
    expect_arity("EOF", args, 1)?;
    let name = string_arg("EOF", &args[0])?;
    Ok(Value::Boolean(host.files.is_eof(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::error::ErrorKind;

    fn call(name: &str, args: &[Value]) -> InterpResult<Value> {
        let builtin = lookup(name).expect("registered builtin");
        let mut host = HostContext::new(Some(7));
        (builtin.func)(&mut host, args)
    }

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    fn string_result(name: &str, args: &[Value]) -> String {
        match call(name, args).expect("builtin succeeds") {
            Value::String(s) => s,
            other => panic!("expected STRING, got {}", other.type_name()),
        }
    }

    fn date(d: u32, m: u32, y: i32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
    }

    #[test]
    fn test_every_documented_builtin_is_registered() {
        for (name, _, _) in BUILTIN_DOCS {
            assert!(lookup(name).is_some(), "{name} missing");
        }
        assert_eq!(BUILTIN_DOCS.len(), BUILTINS.len());
    }

    #[test]
    fn test_length() {
        let got = call("LENGTH", &[s("Hello World")]).expect("ok");
        assert_eq!(got.as_int(), Some(11));
        let err = call("LENGTH", &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArityMismatch);
        assert_eq!(err.message, "LENGTH requires 1 argument(s), got 0");
        let err = call("LENGTH", &[Value::Integer(42)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_left_right_mid() {
        assert_eq!(string_result("LEFT", &[s("Hello"), Value::Integer(3)]), "Hel");
        assert_eq!(string_result("LEFT", &[s("Hello"), Value::Integer(10)]), "Hello");
        assert_eq!(string_result("RIGHT", &[s("Hello"), Value::Integer(3)]), "llo");
        assert_eq!(string_result("RIGHT", &[s("Hello"), Value::Integer(0)]), "");
        let mid = |start, len| string_result("MID", &[s("Hello World"), Value::Integer(start), Value::Integer(len)]);
        assert_eq!(mid(7, 5), "World");
        assert_eq!(mid(1, 50), "Hello World");
        assert_eq!(mid(20, 2), "");
    }

    #[test]
    fn test_negative_lengths_are_domain_errors() {
        let err = call("LEFT", &[s("Hello"), Value::Integer(-1)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DomainError);
        assert_eq!(err.message, "LEFT: length must not be negative");
        assert!(call("RIGHT", &[s("Hello"), Value::Integer(-1)]).is_err());
    }

    #[test]
    fn test_case_mapping_keeps_kind() {
        assert!(matches!(call("LCASE", &[Value::Char('A')]), Ok(Value::Char('a'))));
        assert!(matches!(call("UCASE", &[Value::Char('5')]), Ok(Value::Char('5'))));
        assert_eq!(string_result("UCASE", &[s("Hello World")]), "HELLO WORLD");
        assert_eq!(string_result("TO_LOWER", &[s("HELLO")]), "hello");
    }

    #[test]
    fn test_asc_and_chr() {
        assert_eq!(call("ASC", &[Value::Char('A')]).expect("ok").as_int(), Some(65));
        assert_eq!(call("ASC", &[s("Hello")]).expect("ok").as_int(), Some(72));
        assert!(call("ASC", &[s("")]).is_err());
        assert!(matches!(call("CHR", &[Value::Integer(97)]), Ok(Value::Char('a'))));
        assert!(call("CHR", &[Value::Integer(-1)]).is_err());
    }

    #[test]
    fn test_int_truncates() {
        assert_eq!(call("INT", &[Value::Real(3.7)]).expect("ok").as_int(), Some(3));
        assert_eq!(call("INT", &[Value::Real(-3.7)]).expect("ok").as_int(), Some(-3));
        assert_eq!(call("INT", &[Value::Integer(5)]).expect("ok").as_int(), Some(5));
    }

    #[test]
    fn test_random_ranges() {
        let mut host = HostContext::new(Some(42));
        for _ in 0..100 {
            let x = builtin_rand(&mut host, &[Value::Integer(10)]).expect("ok");
            let x = x.as_real().expect("real");
            assert!((0.0..10.0).contains(&x));
            let y = builtin_random(&mut host, &[]).expect("ok").as_real().expect("real");
            assert!((0.0..1.0).contains(&y));
        }
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = HostContext::new(Some(9));
        let mut b = HostContext::new(Some(9));
        let x = builtin_random(&mut a, &[]).expect("ok").as_real();
        let y = builtin_random(&mut b, &[]).expect("ok").as_real();
        assert_eq!(x, y);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        let round = |x: f64, p: i64| {
            call("ROUND", &[Value::Real(x), Value::Integer(p)])
                .expect("ok")
                .as_real()
                .expect("real")
        };
        assert_eq!(round(3.14159, 2), 3.14);
        assert_eq!(round(2.5, 0), 3.0);
        assert_eq!(round(-2.5, 0), -3.0);
        assert_eq!(round(123.456, 1), 123.5);
    }

    #[test]
    fn test_abs_sqrt_pow() {
        assert_eq!(call("ABS", &[Value::Integer(-5)]).expect("ok").as_int(), Some(5));
        assert_eq!(call("ABS", &[Value::Real(-3.14)]).expect("ok").as_real(), Some(3.14));
        assert_eq!(call("SQRT", &[Value::Integer(9)]).expect("ok").as_real(), Some(3.0));
        let err = call("SQRT", &[Value::Integer(-1)]).unwrap_err();
        assert_eq!(err.message, "SQRT: negative argument");
        let pow = call("POW", &[Value::Real(2.5), Value::Integer(2)]).expect("ok");
        assert_eq!(pow.as_real(), Some(6.25));
    }

    #[test]
    fn test_number_conversions() {
        assert_eq!(string_result("NUM_TO_STR", &[Value::Integer(-10)]), "-10");
        assert_eq!(string_result("NUM_TO_STR", &[Value::Real(10.0)]), "10");
        assert_eq!(string_result("NUM_TO_STR", &[Value::Real(3.14)]), "3.14");
        assert!(matches!(call("STR_TO_NUM", &[s("42")]), Ok(Value::Integer(42))));
        assert_eq!(call("STR_TO_NUM", &[s("3.14")]).expect("ok").as_real(), Some(3.14));
        let err = call("STR_TO_NUM", &[s("abc")]).unwrap_err();
        assert_eq!(err.message, "STR_TO_NUM: invalid number: abc");
        assert!(matches!(call("IS_NUM", &[s("12.5")]), Ok(Value::Boolean(true))));
        assert!(matches!(call("IS_NUM", &[s("twelve")]), Ok(Value::Boolean(false))));
    }

    #[test]
    fn test_date_parts() {
        let d = date(4, 10, 2003);
        assert_eq!(call("DAY", &[d.clone()]).expect("ok").as_int(), Some(4));
        assert_eq!(call("MONTH", &[d.clone()]).expect("ok").as_int(), Some(10));
        assert_eq!(call("YEAR", &[d]).expect("ok").as_int(), Some(2003));
        assert!(call("DAY", &[s("04/10/2003")]).is_err());
    }

    #[test]
    fn test_dayindex_starts_on_sunday() {
        // 7 May 2023 was a Sunday
        assert_eq!(call("DAYINDEX", &[date(7, 5, 2023)]).expect("ok").as_int(), Some(1));
        assert_eq!(call("DAYINDEX", &[date(13, 5, 2023)]).expect("ok").as_int(), Some(7));
    }

    #[test]
    fn test_setdate() {
        let got = call(
            "SETDATE",
            &[Value::Integer(26), Value::Integer(10), Value::Integer(2003)],
        )
        .expect("ok");
        assert_eq!(got.to_string(), "26/10/2003");
        let err = call(
            "SETDATE",
            &[Value::Integer(31), Value::Integer(2), Value::Integer(2023)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DomainError);
        assert!(call("SETDATE", &[Value::Integer(1), Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_now_takes_no_arguments() {
        assert!(matches!(call("NOW", &[]), Ok(Value::Date(_))));
        assert!(call("TODAY", &[Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_eof_for_unopened_file() {
        assert!(matches!(call("EOF", &[s("nothing.txt")]), Ok(Value::Boolean(true))));
    }
}
