//! Mixed-radix enumeration of rate combinations.
//!
//! Axes with no rates are skipped. When no axis has a rate there is nothing
//! to price and the enumeration is empty.

use crate::model::Id;

/// Number of combinations the non-empty axes span, saturating at `usize::MAX`
pub fn combination_count<I>(axis_sizes: I) -> usize
where
    I: IntoIterator<Item = usize>,
{
    let mut sizes = axis_sizes.into_iter().filter(|n| *n > 0).peekable();
    if sizes.peek().is_none() {
        return 0;
    }
    sizes.fold(1usize, |acc, n| acc.saturating_mul(n))
}

/// Odometer over one slice of rate ids per axis. The last axis turns fastest.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    axes: Vec<&'a [Id]>,
    indexes: Vec<usize>,
    exhausted: bool,
}

impl<'a> Combinations<'a> {
    pub fn new<I>(axes: I) -> Self
    where
        I: IntoIterator<Item = &'a [Id]>,
    {
        let axes: Vec<&'a [Id]> = axes.into_iter().filter(|a| !a.is_empty()).collect();
        let exhausted = axes.is_empty();
        Self {
            indexes: vec![0; axes.len()],
            axes,
            exhausted,
        }
    }

    pub fn count_total(&self) -> usize {
        combination_count(self.axes.iter().map(|a| a.len()))
    }

    fn current(&self) -> Vec<Id> {
        self.axes
            .iter()
            .zip(&self.indexes)
            .map(|(axis, &i)| axis[i])
            .collect()
    }

    /// Advance the rightmost wheel, carrying leftwards on overflow
    fn advance(&mut self) {
        for position in (0..self.axes.len()).rev() {
            self.indexes[position] += 1;
            if self.indexes[position] < self.axes[position].len() {
                return;
            }
            self.indexes[position] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for Combinations<'_> {
    type Item = Vec<Id>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let row = self.current();
        self.advance();
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use std::collections::HashSet;

    #[test]
    fn test_color_size_example_order() {
        let color = [1, 2];
        let size = [3, 4];
        let rows: Vec<Vec<Id>> = Combinations::new([&color[..], &size[..]]).collect();
        assert_eq!(rows, vec![vec![1, 3], vec![1, 4], vec![2, 3], vec![2, 4]]);
    }

    #[test]
    fn test_row_count_is_product_of_axis_sizes() {
        let axes: Vec<Vec<Id>> = vec![vec![1, 2, 3], vec![10, 11], vec![20, 21, 22, 23]];
        let combos = Combinations::new(axes.iter().map(|a| a.as_slice()));
        assert_eq!(combos.count_total(), 24);

        let rows: Vec<Vec<Id>> = combos.collect();
        assert_eq!(rows.len(), 24);
        let distinct: HashSet<&Vec<Id>> = rows.iter().collect();
        assert_eq!(distinct.len(), 24);
    }

    #[test]
    fn test_matches_multi_cartesian_product_order() {
        let axes: Vec<Vec<Id>> = vec![vec![5, 6], vec![7], vec![8, 9, 10]];
        let expected: Vec<Vec<Id>> = axes
            .iter()
            .map(|a| a.iter().copied())
            .multi_cartesian_product()
            .collect();
        let rows: Vec<Vec<Id>> = Combinations::new(axes.iter().map(|a| a.as_slice())).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_empty_axis_is_skipped() {
        let color = [1, 2];
        let empty: [Id; 0] = [];
        let size = [3];
        let rows: Vec<Vec<Id>> =
            Combinations::new([&color[..], &empty[..], &size[..]]).collect();
        assert_eq!(rows, vec![vec![1, 3], vec![2, 3]]);
        assert_eq!(combination_count([2, 0, 1]), 2);
    }

    #[test]
    fn test_no_rates_means_no_rows() {
        let empty: [Id; 0] = [];
        assert_eq!(Combinations::new([&empty[..]]).count(), 0);
        assert_eq!(Combinations::new(Vec::<&[Id]>::new()).count(), 0);
        assert_eq!(combination_count(Vec::new()), 0);
        assert_eq!(combination_count([0, 0]), 0);
    }

    #[test]
    fn test_count_saturates() {
        assert_eq!(combination_count([usize::MAX, 2]), usize::MAX);
    }
}
