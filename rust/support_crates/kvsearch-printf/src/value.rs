use kvsearch_common::{Result, error::Error};
use kvsearch_memory::MemoryCursor;

use crate::specifier::Specifier;

/// How an argument is pulled from the varargs area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoder {
    I32,
    U32,
    I64,
    U64,
    F64,
    Str,
    Percent,
}

/// Decoder selection by (accepted length modifiers, conversions).
const DECODERS: &[(&[&str], &str, Decoder)] = &[
    (&["hh", "h", "l", "z", "t", ""], "dic", Decoder::I32),
    (&["hh", "h", "l", "z", "t", ""], "uxXop", Decoder::U32),
    (&["ll", "j"], "di", Decoder::I64),
    (&["ll", "j"], "uxXop", Decoder::U64),
    (&["L", ""], "fFeEgGaA", Decoder::F64),
    (&[""], "s", Decoder::Str),
    (&[""], "%", Decoder::Percent),
];

/// A decoded argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'a str),
    Percent,
}

/// Pulls the argument described by `spec` from `args`.
pub fn decode<'a>(spec: &Specifier<'_>, args: &mut MemoryCursor<'a>) -> Result<Value<'a>> {
    let decoder = DECODERS
        .iter()
        .find(|(lengths, conversions, _)| {
            lengths.contains(&spec.length) && conversions.contains(spec.conversion)
        })
        .map(|&(_, _, decoder)| decoder)
        .ok_or_else(|| Error::format_specifier(spec.text, "invalid format specifier"))?;

    Ok(match decoder {
        Decoder::I32 => Value::Int(args.read_i32_le()? as i64),
        Decoder::U32 => Value::UInt(args.read_u32_le()? as u64),
        Decoder::I64 => Value::Int(args.read_i64_le()?),
        Decoder::U64 => Value::UInt(args.read_u64_le()?),
        Decoder::F64 => Value::Float(args.read_f64_le()?),
        Decoder::Str => Value::Str(args.read_pointer()?.read_c_str()?),
        Decoder::Percent => Value::Percent,
    })
}

/// Renders a decoded value for the given conversion character.
pub fn render(conversion: char, value: &Value<'_>) -> String {
    match (conversion, value) {
        (_, Value::Percent) => "%".to_string(),
        (_, Value::Str(s)) => s.to_string(),
        ('c', Value::Int(code)) => u32::try_from(*code)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string(),
        ('x' | 'p', Value::UInt(v)) => format!("{v:x}"),
        ('X', Value::UInt(v)) => format!("{v:X}"),
        ('o', Value::UInt(v)) => format!("{v:o}"),
        (_, Value::Int(v)) => v.to_string(),
        (_, Value::UInt(v)) => v.to_string(),
        ('e', Value::Float(v)) => exponential(*v),
        ('E', Value::Float(v)) => exponential(*v).to_uppercase(),
        ('a', Value::Float(v)) => hex_float(*v),
        ('A', Value::Float(v)) => hex_float(*v).to_uppercase(),
        ('f', Value::Float(v)) => fixed(*v),
        ('F', Value::Float(v)) => fixed(*v).to_uppercase(),
        ('G', Value::Float(v)) => v.to_string().to_uppercase(),
        (_, Value::Float(v)) => v.to_string(),
    }
}

const MAX_FRACTION_DIGITS: usize = 20;

/// Positional notation, at most 20 fractional digits, no trailing zeros.
fn fixed(v: f64) -> String {
    let shortest = v.to_string();
    match shortest.split_once('.') {
        Some((_, fraction)) if fraction.len() > MAX_FRACTION_DIGITS => {
            let rounded = format!("{v:.prec$}", prec = MAX_FRACTION_DIGITS);
            rounded
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        }
        _ => shortest,
    }
}

/// Two fractional digits and an explicitly signed exponent, e.g. `1.50e+3`.
fn exponential(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let s = format!("{v:.2e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

/// C-style hexadecimal floating point, e.g. `0x1.8p+1` for `3.0`.
fn hex_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    let sign = if v.is_sign_negative() { "-" } else { "" };
    if v.is_infinite() {
        return format!("{sign}inf");
    }
    if v == 0.0 {
        return format!("{sign}0x0p+0");
    }

    let bits = v.to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (lead, exp) = if biased_exp == 0 {
        (0, -1022)
    } else {
        (1, biased_exp - 1023)
    };
    let exp_sign = if exp < 0 { "-" } else { "+" };

    let digits = format!("{fraction:013x}");
    let digits = digits.trim_end_matches('0');
    if digits.is_empty() {
        format!("{sign}0x{lead}p{exp_sign}{}", exp.abs())
    } else {
        format!("{sign}0x{lead}.{digits}p{exp_sign}{}", exp.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::{Value, exponential, fixed, hex_float, render};

    #[test]
    fn test_integer_rendering() {
        assert_eq!(render('d', &Value::Int(-42)), "-42");
        assert_eq!(render('u', &Value::UInt(42)), "42");
        assert_eq!(render('x', &Value::UInt(255)), "ff");
        assert_eq!(render('X', &Value::UInt(255)), "FF");
        assert_eq!(render('o', &Value::UInt(8)), "10");
        assert_eq!(render('p', &Value::UInt(0x1000)), "1000");
        assert_eq!(render('c', &Value::Int(65)), "A");
        assert_eq!(render('c', &Value::Int(-1)), "\u{fffd}");
    }

    #[test]
    fn test_float_rendering() {
        assert_eq!(render('f', &Value::Float(1.5)), "1.5");
        assert_eq!(render('f', &Value::Float(1e21)), "1000000000000000000000");
        assert_eq!(render('g', &Value::Float(0.1)), "0.1");
        assert_eq!(render('F', &Value::Float(f64::INFINITY)), "INF");
        assert_eq!(render('f', &Value::Float(0.1 + 0.2)), "0.30000000000000004");
        assert_eq!(render('f', &Value::Float(1.5e-19)), "0.00000000000000000015");
        assert_eq!(exponential(1500.0), "1.50e+3");
        assert_eq!(exponential(0.015), "1.50e-2");
        assert_eq!(render('E', &Value::Float(1500.0)), "1.50E+3");
    }

    #[test]
    fn test_fixed_caps_fraction_digits() {
        assert_eq!(fixed(1.25e-20), "0.00000000000000000001");
        assert_eq!(fixed(1e-21), "0");
        assert_eq!(fixed(-1e-21), "-0");
        assert_eq!(fixed(12.0), "12");
    }

    #[test]
    fn test_hex_float() {
        assert_eq!(hex_float(1.0), "0x1p+0");
        assert_eq!(hex_float(3.0), "0x1.8p+1");
        assert_eq!(hex_float(-0.5), "-0x1p-1");
        assert_eq!(hex_float(0.0), "0x0p+0");
        assert_eq!(render('A', &Value::Float(3.0)), "0X1.8P+1");
    }
}
