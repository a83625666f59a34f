//! Allocation pass: distribute a container's main-axis space among children.
//!
//! 1. Gaps between children are taken off the top.
//! 2. Fixed children get their size in declaration order, as long as space lasts.
//! 3. Flexible children get their minimum, then split what remains by weight.
//!    Rounding leftovers go one cell each to the earliest flexible children.

use super::types::Demand;

/// Allocate `available` cells along the main axis.
///
/// Returns one size per demand, in order. The sum never exceeds `available`
/// minus the gaps.
pub fn allocate(available: usize, spacing: usize, demands: &[Demand]) -> Vec<usize> {
    let gaps = spacing.saturating_mul(demands.len().saturating_sub(1));
    let mut remaining = available.saturating_sub(gaps);
    let mut sizes = vec![0; demands.len()];

    for (size, demand) in sizes.iter_mut().zip(demands) {
        if !demand.flexible {
            *size = demand.size.min(remaining);
            remaining -= *size;
        }
    }

    for (size, demand) in sizes.iter_mut().zip(demands) {
        if demand.flexible {
            *size = demand.size.min(remaining);
            remaining -= *size;
        }
    }

    let total_weight: u64 = demands
        .iter()
        .filter(|d| d.flexible)
        .map(|d| u64::from(d.weight))
        .sum();
    if total_weight == 0 || remaining == 0 {
        return sizes;
    }

    let pool = remaining as u64;
    let mut handed_out = 0;
    for (size, demand) in sizes.iter_mut().zip(demands) {
        if demand.flexible {
            let share = (pool * u64::from(demand.weight) / total_weight) as usize;
            *size += share;
            handed_out += share;
        }
    }

    let mut leftover = remaining - handed_out;
    for (size, demand) in sizes.iter_mut().zip(demands) {
        if leftover == 0 {
            break;
        }
        if demand.flexible && demand.weight > 0 {
            *size += 1;
            leftover -= 1;
        }
    }

    sizes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_then_equal_flex() {
        let demands = [Demand::fixed(10), Demand::flexible(1), Demand::flexible(1)];
        assert_eq!(allocate(30, 0, &demands), vec![10, 10, 10]);
    }

    #[test]
    fn weighted_flex() {
        let demands = [Demand::flexible(1), Demand::flexible(3)];
        assert_eq!(allocate(20, 0, &demands), vec![5, 15]);
    }

    #[test]
    fn rounding_goes_to_first_flexible() {
        let demands = [Demand::flexible(1), Demand::fixed(2), Demand::flexible(1)];
        assert_eq!(allocate(7, 0, &demands), vec![3, 2, 2]);
    }

    #[test]
    fn fixed_children_truncated_in_order() {
        let demands = [Demand::fixed(6), Demand::fixed(6), Demand::flexible(1)];
        assert_eq!(allocate(8, 0, &demands), vec![6, 2, 0]);
    }

    #[test]
    fn spacing_comes_first() {
        let demands = [Demand::fixed(3), Demand::flexible(1)];
        assert_eq!(allocate(10, 2, &demands), vec![3, 5]);
    }

    #[test]
    fn flexible_minimum_is_honored() {
        let demands = [
            Demand { size: 4, flexible: true, weight: 1 },
            Demand::flexible(1),
        ];
        assert_eq!(allocate(10, 0, &demands), vec![7, 3]);
    }

    #[test]
    fn empty() {
        assert!(allocate(10, 1, &[]).is_empty());
    }
}
