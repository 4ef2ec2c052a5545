//! Random test data generator.

use std::io::{self, prelude::*};

use rand::Rng;

/// Characters random lines are made of.
pub const SYMBOLS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

/// Generates a random line of length in `0..=max_len` without a terminator.
pub fn random_line<R: Rng>(rng: &mut R, max_len: usize) -> String {
    let len = rng.gen_range(0..=max_len);
    String::from_iter((0..len).map(|_| SYMBOLS[rng.gen_range(0..SYMBOLS.len())] as char))
}

/// Writes `count` newline terminated random lines to the writer.
///
/// # Arguments
/// * `writer` - Destination of generated lines
/// * `rng` - Random number generator
/// * `max_len` - Maximum line length
/// * `count` - Number of lines to generate
pub fn populate<W: Write, R: Rng>(writer: &mut W, rng: &mut R, max_len: usize, count: usize) -> io::Result<()> {
    for _ in 0..count {
        let line = random_line(rng, max_len);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    return Ok(());
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::*;

    use super::{populate, random_line, SYMBOLS};

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(50)]
    fn test_random_line(#[case] max_len: usize) {
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..100 {
            let line = random_line(&mut rng, max_len);
            assert!(line.len() <= max_len);
            assert!(line.bytes().all(|b| SYMBOLS.contains(&b)));
        }
    }

    #[test]
    fn test_populate() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut buf = Vec::new();

        populate(&mut buf, &mut rng, 10, 25).unwrap();

        assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 25);
        assert!(buf.ends_with(b"\n"));
    }

    #[test]
    fn test_populate_reproducible() {
        let mut first = Vec::new();
        let mut second = Vec::new();

        populate(&mut first, &mut StdRng::seed_from_u64(5), 20, 10).unwrap();
        populate(&mut second, &mut StdRng::seed_from_u64(5), 20, 10).unwrap();

        assert_eq!(first, second);
    }
}
