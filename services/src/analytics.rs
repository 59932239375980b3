//! Dashboard aggregates over graded submissions.

use marker::LetterGrade;
use serde::Serialize;

pub const PASS_MARK: u32 = 50;

const LETTERS: [LetterGrade; 6] = [
    LetterGrade::APlus,
    LetterGrade::A,
    LetterGrade::B,
    LetterGrade::C,
    LetterGrade::D,
    LetterGrade::F,
];

/// Distribution of final percentages. Every float is rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p75: f64,
    pub stddev: f64,
    pub best: u32,
    pub worst: u32,
    /// % of grades at or above [`PASS_MARK`].
    pub pass_rate: f64,
    pub num_passed: usize,
    pub num_failed: usize,
    /// Count per letter, best letter first. Letters with no grades are included.
    pub letters: Vec<(LetterGrade, usize)>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn mean(xs: &[u32]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().map(|&x| f64::from(x)).sum::<f64>() / xs.len() as f64
}

/// Linear interpolation between closest ranks. `xs` must be sorted.
fn percentile(xs: &[u32], p: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let last = (xs.len() - 1) as f64;
    let pos = (p * last).clamp(0.0, last);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        f64::from(xs[lo])
    } else {
        let w = pos - lo as f64;
        f64::from(xs[lo]) * (1.0 - w) + f64::from(xs[hi]) * w
    }
}

/// Sample standard deviation; zero for fewer than two grades.
fn stddev(xs: &[u32]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs
        .iter()
        .map(|&x| {
            let d = f64::from(x) - m;
            d * d
        })
        .sum::<f64>()
        / (xs.len() as f64 - 1.0);
    var.sqrt()
}

pub fn grade_stats(percentages: &[u32]) -> GradeStats {
    let mut sorted = percentages.to_vec();
    sorted.sort_unstable();

    let num_passed = sorted.iter().filter(|&&p| p >= PASS_MARK).count();
    let pass_rate = if sorted.is_empty() {
        0.0
    } else {
        num_passed as f64 / sorted.len() as f64 * 100.0
    };

    let letters = LETTERS
        .iter()
        .map(|&l| {
            let n = sorted
                .iter()
                .filter(|&&p| LetterGrade::from_percentage(p) == l)
                .count();
            (l, n)
        })
        .collect();

    GradeStats {
        count: sorted.len(),
        mean: round1(mean(&sorted)),
        median: round1(percentile(&sorted, 0.5)),
        p75: round1(percentile(&sorted, 0.75)),
        stddev: round1(stddev(&sorted)),
        best: sorted.last().copied().unwrap_or(0),
        worst: sorted.first().copied().unwrap_or(0),
        pass_rate: round1(pass_rate),
        num_passed,
        num_failed: sorted.len() - num_passed,
        letters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(stats: &GradeStats, l: LetterGrade) -> usize {
        stats.letters.iter().find(|(x, _)| *x == l).map(|(_, n)| *n).unwrap()
    }

    #[test]
    fn empty_is_all_zero() {
        let s = grade_stats(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.pass_rate, 0.0);
        assert_eq!((s.best, s.worst), (0, 0));
        assert!(s.letters.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn distribution() {
        let s = grade_stats(&[95, 40, 70, 85, 60, 72]);
        assert_eq!(s.count, 6);
        assert_eq!(s.mean, 70.3);
        assert_eq!(s.median, 71.0);
        assert_eq!(s.p75, 81.8);
        assert_eq!(s.stddev, 19.3);
        assert_eq!((s.best, s.worst), (95, 40));
        assert_eq!((s.num_passed, s.num_failed), (5, 1));
        assert_eq!(s.pass_rate, 83.3);
        assert_eq!(letter(&s, LetterGrade::APlus), 1);
        assert_eq!(letter(&s, LetterGrade::A), 1);
        assert_eq!(letter(&s, LetterGrade::B), 2);
        assert_eq!(letter(&s, LetterGrade::C), 1);
        assert_eq!(letter(&s, LetterGrade::F), 1);
    }

    #[test]
    fn pass_mark_is_inclusive() {
        let s = grade_stats(&[50, 49]);
        assert_eq!(s.num_passed, 1);
        assert_eq!(s.pass_rate, 50.0);
        assert_eq!(letter(&s, LetterGrade::D), 1);
        assert_eq!(s.stddev, 0.7);
    }
}
