//! Ordered breakpoint tables.
//!
//! A ladder maps a measured value to the output of the highest rung it
//! reaches, or to the floor value when it reaches none. Each rung carries its
//! own boundary, so one table can mix "above" and "at least" breakpoints.

/// How a value is compared against a rung's breakpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    /// The rung applies once the value is at or above the breakpoint
    Inclusive,
    /// The rung applies only once the value is strictly above the breakpoint
    Exclusive,
}

impl Boundary {
    fn reaches(self, value: f64, breakpoint: f64) -> bool {
        match self {
            Boundary::Inclusive => value >= breakpoint,
            Boundary::Exclusive => value > breakpoint,
        }
    }
}

/// One breakpoint and the output it selects
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rung<T> {
    pub breakpoint: f64,
    pub boundary: Boundary,
    pub output: T,
}

impl<T> Rung<T> {
    /// Applies to values strictly above `breakpoint`
    pub const fn above(breakpoint: f64, output: T) -> Self {
        Self {
            breakpoint,
            boundary: Boundary::Exclusive,
            output,
        }
    }

    /// Applies to values at or above `breakpoint`
    pub const fn at_least(breakpoint: f64, output: T) -> Self {
        Self {
            breakpoint,
            boundary: Boundary::Inclusive,
            output,
        }
    }

    fn reached_by(&self, value: f64) -> bool {
        self.boundary.reaches(value, self.breakpoint)
    }
}

/// Threshold table with rungs sorted by ascending breakpoint
#[derive(Clone, Copy, Debug)]
pub struct Ladder<T: 'static> {
    rungs: &'static [Rung<T>],
    floor: T,
}

impl<T: Copy> Ladder<T> {
    pub const fn new(rungs: &'static [Rung<T>], floor: T) -> Self {
        Self { rungs, floor }
    }

    pub fn lookup(&self, value: f64) -> T {
        self.rungs
            .iter()
            .rev()
            .find(|rung| rung.reached_by(value))
            .map(|rung| rung.output)
            .unwrap_or(self.floor)
    }

    /// True when breakpoints are strictly ascending
    pub fn is_sorted(&self) -> bool {
        self.rungs
            .windows(2)
            .all(|pair| pair[0].breakpoint < pair[1].breakpoint)
    }
}
