use std::collections::VecDeque;

use crate::visibility::Partition;

/// Order a partition for dispatch: visible URLs first, then offscreen ones.
///
/// Each half keeps its discovery order.
#[must_use]
pub fn build_queue(partition: Partition) -> VecDeque<String> {
    let Partition { visible, offscreen } = partition;
    visible.into_iter().chain(offscreen).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_before_offscreen() {
        let partition = Partition {
            visible: vec!["B".to_string(), "D".to_string()],
            offscreen: vec!["A".to_string(), "C".to_string()],
        };

        assert_eq!(build_queue(partition), ["B", "D", "A", "C"]);
    }

    #[test]
    fn test_empty_partition() {
        assert!(build_queue(Partition::default()).is_empty());
    }
}
