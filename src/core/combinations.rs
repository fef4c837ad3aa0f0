use crate::domain::model::ItemOption;
use std::fmt;

/// One fully specified product configuration: at most one option per family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combination {
    options: Vec<ItemOption>,
}

impl Combination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &[ItemOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, family: &str) -> Option<&ItemOption> {
        self.options.iter().find(|o| o.family == family)
    }

    /// Replaces the option of `option.family`, or appends it when the family is new.
    pub fn set(&mut self, option: ItemOption) {
        match self.options.iter_mut().find(|o| o.family == option.family) {
            Some(existing) => *existing = option,
            None => self.options.push(option),
        }
    }

    fn conflicts_with(&self, option: &ItemOption) -> bool {
        self.get(&option.family)
            .is_some_and(|o| o.plan_code != option.plan_code)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.options.is_empty() {
            return write!(f, "(no options)");
        }
        let parts: Vec<String> = self.options.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Expands options into every combination holding one value per family.
///
/// Options are folded in one at a time. A combination that already holds a
/// different value for the incoming family is cloned with that value swapped
/// in; otherwise the option is set in place. Combinations cloned during a
/// step are not revisited in that same step.
pub fn generate_combinations(options: &[ItemOption]) -> Vec<Combination> {
    let mut combinations: Vec<Combination> = Vec::new();
    let mut seen: Vec<&ItemOption> = Vec::new();

    for option in options {
        if seen.contains(&option) {
            continue;
        }
        seen.push(option);

        if combinations.is_empty() {
            let mut first = Combination::new();
            first.set(option.clone());
            combinations.push(first);
            continue;
        }

        let existing = combinations.len();
        for index in 0..existing {
            if combinations[index].conflicts_with(option) {
                let mut clone = combinations[index].clone();
                clone.set(option.clone());
                // a family with 3+ values reaches the same clone from several parents
                if !combinations.contains(&clone) {
                    combinations.push(clone);
                }
            } else {
                combinations[index].set(option.clone());
            }
        }
    }

    combinations
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn opt(family: &str, plan_code: &str) -> ItemOption {
        ItemOption::new(family, plan_code)
    }

    fn as_set(combinations: &[Combination]) -> HashSet<Vec<String>> {
        combinations
            .iter()
            .map(|c| {
                let mut parts: Vec<String> = c.options().iter().map(|o| o.to_string()).collect();
                parts.sort();
                parts
            })
            .collect()
    }

    fn assert_family_exclusive(combinations: &[Combination]) {
        for combination in combinations {
            let families: HashSet<&str> =
                combination.options().iter().map(|o| o.family.as_str()).collect();
            assert_eq!(families.len(), combination.len(), "duplicate family in {}", combination);
        }
    }

    #[test]
    fn test_empty_input_yields_no_combinations() {
        assert!(generate_combinations(&[]).is_empty());
    }

    #[test]
    fn test_singleton_family_extends_without_multiplying() {
        let combinations = generate_combinations(&[
            opt("memory", "ram-1"),
            opt("memory", "ram-2"),
            opt("storage", "disk-x"),
        ]);

        assert_eq!(combinations.len(), 2);
        assert_eq!(
            combinations[0].options(),
            &[opt("memory", "ram-1"), opt("storage", "disk-x")]
        );
        assert_eq!(
            combinations[1].options(),
            &[opt("memory", "ram-2"), opt("storage", "disk-x")]
        );
    }

    #[test]
    fn test_two_by_two_covers_every_pair() {
        let combinations = generate_combinations(&[
            opt("memory", "ram-1"),
            opt("memory", "ram-2"),
            opt("storage", "disk-x"),
            opt("storage", "disk-y"),
        ]);

        assert_eq!(combinations.len(), 4);
        assert_family_exclusive(&combinations);
        let expected: HashSet<Vec<String>> = [
            ["memory=ram-1", "storage=disk-x"],
            ["memory=ram-1", "storage=disk-y"],
            ["memory=ram-2", "storage=disk-x"],
            ["memory=ram-2", "storage=disk-y"],
        ]
        .iter()
        .map(|pair| pair.iter().map(|s| s.to_string()).collect())
        .collect();
        assert_eq!(as_set(&combinations), expected);
    }

    #[test]
    fn test_generation_order_follows_input() {
        let combinations = generate_combinations(&[
            opt("memory", "ram-1"),
            opt("memory", "ram-2"),
            opt("storage", "disk-x"),
            opt("storage", "disk-y"),
        ]);

        let order: Vec<String> = combinations.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            order,
            vec![
                "memory=ram-1, storage=disk-x",
                "memory=ram-2, storage=disk-x",
                "memory=ram-1, storage=disk-y",
                "memory=ram-2, storage=disk-y",
            ]
        );
    }

    #[test]
    fn test_input_order_does_not_change_the_set() {
        let ordered = generate_combinations(&[
            opt("memory", "ram-1"),
            opt("memory", "ram-2"),
            opt("storage", "disk-x"),
            opt("storage", "disk-y"),
            opt("bandwidth", "bw-100"),
        ]);
        let interleaved = generate_combinations(&[
            opt("storage", "disk-y"),
            opt("memory", "ram-2"),
            opt("bandwidth", "bw-100"),
            opt("storage", "disk-x"),
            opt("memory", "ram-1"),
        ]);

        assert_eq!(ordered.len(), 4);
        assert_eq!(as_set(&ordered), as_set(&interleaved));
    }

    #[test]
    fn test_three_values_per_family_without_duplicates() {
        let combinations = generate_combinations(&[
            opt("memory", "ram-1"),
            opt("memory", "ram-2"),
            opt("memory", "ram-3"),
            opt("storage", "disk-x"),
            opt("storage", "disk-y"),
        ]);

        assert_eq!(combinations.len(), 6);
        assert_eq!(as_set(&combinations).len(), 6);
        assert_family_exclusive(&combinations);
    }

    #[test]
    fn test_repeated_option_is_ignored() {
        let combinations = generate_combinations(&[
            opt("memory", "ram-1"),
            opt("memory", "ram-2"),
            opt("memory", "ram-1"),
        ]);

        assert_eq!(combinations.len(), 2);
    }

    #[test]
    fn test_cross_product_size() {
        for (m, n) in [(1, 1), (1, 3), (2, 2), (3, 4), (5, 2)] {
            let mut input = Vec::new();
            for i in 0..m {
                input.push(opt("memory", &format!("ram-{}", i)));
            }
            for j in 0..n {
                input.push(opt("storage", &format!("disk-{}", j)));
            }

            let combinations = generate_combinations(&input);

            assert_eq!(combinations.len(), m * n, "m={} n={}", m, n);
            assert_eq!(as_set(&combinations).len(), m * n);
            assert!(combinations.iter().all(|c| c.len() == 2));
        }
    }
}
