use std::collections::BTreeMap;
use std::convert::TryFrom;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use super::defaults::BuilderConfig;

pub const JVM_ARGS_ENV_KEY: &str = "INSTALL4J_ADD_VM_PARAMS";

lazy_static! {
    // sign, decimal number, then a binary suffix, a decimal suffix or an exponent
    static ref QUANTITY_REGEX: Regex = Regex::new(
        r"^([+-]?)([0-9]+(?:\.[0-9]*)?|\.[0-9]+)(Ki|Mi|Gi|Ti|Pi|Ei|[numkMGTPE]|[eE][+-]?[0-9]+)?$"
    )
    .unwrap();
}

// 10^38 is the largest power of ten a u128 holds.
const MAX_DECIMAL_EXPONENT: i64 = 38;

#[derive(Debug, thiserror::Error)]
pub enum QuantityError {
    #[error("{0:?} is not a valid quantity")]
    Malformed(String),

    #[error("{0:?} is negative")]
    Negative(String),

    #[error("{0:?} does not fit in 64 bits once scaled")]
    Overflow(String),
}

/// Converts a Kubernetes quantity into SI megabytes (10^6), rounding up the
/// way `ScaledValue(Mega)` does on the API server.
pub fn scaled_megabytes(quantity: &Quantity) -> Result<u64, QuantityError> {
    let raw = quantity.0.trim();
    let captures = QUANTITY_REGEX
        .captures(raw)
        .ok_or_else(|| QuantityError::Malformed(raw.to_string()))?;

    let number = &captures[2];
    let (integer_part, fraction_part) = match number.find('.') {
        Some(index) => (&number[..index], number[index + 1..].trim_end_matches('0')),
        None => (number, ""),
    };

    let mut mantissa: u128 = 0;
    for digit in integer_part.chars().chain(fraction_part.chars()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(u128::from(digit as u8 - b'0')))
            .ok_or_else(|| QuantityError::Overflow(raw.to_string()))?;
    }

    if &captures[1] == "-" && mantissa != 0 {
        return Err(QuantityError::Negative(raw.to_string()));
    }

    let suffix = captures.get(3).map_or("", |s| s.as_str());
    let (binary_exponent, decimal_exponent) = suffix_exponents(suffix)
        .ok_or_else(|| QuantityError::Malformed(raw.to_string()))?;

    let overflow = || QuantityError::Overflow(raw.to_string());

    let numerator = mantissa
        .checked_mul(1u128.checked_shl(binary_exponent).ok_or_else(overflow)?)
        .ok_or_else(overflow)?;

    // bytes = numerator * 10^(decimal_exponent - fraction digits); megabytes divides by 10^6
    let exponent = decimal_exponent
        .saturating_sub(fraction_part.len() as i64)
        .saturating_sub(6);

    let megabytes = if exponent >= 0 {
        if exponent > MAX_DECIMAL_EXPONENT {
            return if numerator == 0 { Ok(0) } else { Err(overflow()) };
        }
        numerator
            .checked_mul(10u128.pow(exponent as u32))
            .ok_or_else(overflow)?
    } else if exponent < -MAX_DECIMAL_EXPONENT {
        if numerator == 0 {
            0
        } else {
            1
        }
    } else {
        let divisor = 10u128.pow((-exponent) as u32);
        (numerator + divisor - 1) / divisor
    };

    u64::try_from(megabytes).map_err(|_| overflow())
}

fn suffix_exponents(suffix: &str) -> Option<(u32, i64)> {
    let exponents = match suffix {
        "" => (0, 0),
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        exponent => (0, exponent[1..].parse::<i64>().ok()?),
    };

    Some(exponents)
}

/// Heap and direct memory sizes handed to the JVM, already suffixed.
#[derive(Debug, Clone, PartialEq)]
pub struct JvmMemory {
    pub heap_size: String,
    pub max_direct_memory: String,
}

impl JvmMemory {
    /// Value of the `INSTALL4J_ADD_VM_PARAMS` variable. Xms and Xmx share the heap size.
    pub fn vm_params(&self) -> String {
        format!(
            "-Xms{heap} -Xmx{heap} -XX:MaxDirectMemorySize={direct} -Djava.util.prefs.userRoot=${{NEXUS_DATA}}/javaprefs",
            heap = self.heap_size,
            direct = self.max_direct_memory
        )
    }
}

/// Sizes the JVM from the container memory limit so the process stays below
/// it: 80% of the limit for heap, the whole limit for direct memory. Without
/// a usable limit the configured defaults apply.
pub fn calculate_jvm_memory(
    limits: Option<&BTreeMap<String, Quantity>>,
    config: &BuilderConfig,
) -> JvmMemory {
    let memory_limit = limits.and_then(|l| l.get("memory"));

    if let Some(limit) = memory_limit {
        match scaled_megabytes(limit) {
            Ok(megabytes) => {
                // 8 * megabytes is even, so rounding never hits a tie
                let heap = (u128::from(megabytes) * 8 + 5) / 10;
                return JvmMemory {
                    heap_size: format!("{}m", heap),
                    max_direct_memory: format!("{}m", megabytes),
                };
            }
            Err(err) => warn!("Ignoring memory limit for JVM sizing: {}", err),
        }
    }

    JvmMemory {
        heap_size: config.default_heap_size.clone(),
        max_direct_memory: config.default_max_direct_memory.clone(),
    }
}
