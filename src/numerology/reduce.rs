//! Digit reduction.

/// Master values kept intact when no table overrides them.
pub const DEFAULT_MASTER_VALUES: [u32; 2] = [11, 22];

pub fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Reduce `n` by repeated digit summing until a single digit 1-9 remains,
/// stopping early on any value in `masters`. Returns `None` for zero, which
/// has no numerological value.
pub fn reduce(n: u32, masters: &[u32]) -> Option<u32> {
    let mut x = n;
    loop {
        if x == 0 {
            return None;
        }
        if x < 10 || masters.contains(&x) {
            return Some(x);
        }
        x = digit_sum(x);
    }
}

/// Reduction used by the nine-year cycle: master values collapse
/// (11 to 2, 22 to 4) so the result is always 1-9.
pub fn reduce_for_cycle(n: u32) -> u32 {
    let mut x = n;
    loop {
        match x {
            0 => return 1,
            1..=9 => return x,
            11 => return 2,
            22 => return 4,
            _ => x = digit_sum(x),
        }
    }
}
