//! Names of the terrestrial ecozones of Canada (National Ecological Framework).

const ECOZONES: [&str; 15] = [
    "Arctic Cordillera",
    "Northern Arctic",
    "Southern Arctic",
    "Taiga Plains",
    "Taiga Shield",
    "Boreal Shield",
    "Atlantic Maritime",
    "Mixedwood Plains",
    "Boreal Plains",
    "Prairies",
    "Taiga Cordillera",
    "Boreal Cordillera",
    "Pacific Maritime",
    "Montane Cordillera",
    "Hudson Plains",
];

/// Look up an ecozone name by its numeric id (1-15).
///
/// Accepts ids as they come out of tables, e.g. `"6"` or `"6.0"`.
pub fn ecozone_name(id: &str) -> Option<&'static str> {
    let id = id.trim();
    let n: usize = match id.parse::<usize>() {
        Ok(n) => n,
        Err(_) => {
            let f: f64 = id.parse().ok()?;
            if f.fract() != 0.0 || f < 1.0 {
                return None;
            }
            f as usize
        }
    };
    n.checked_sub(1).and_then(|i| ECOZONES.get(i)).copied()
}
