use crate::models::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// Swap the entry at `index` with its neighbour in `direction`.
/// Returns `None` when either position falls outside the list.
pub fn swap_adjacent<T: Clone>(items: &[T], index: usize, direction: Direction) -> Option<Vec<T>> {
    let target = index.checked_add_signed(direction.offset())?;
    if index >= items.len() || target >= items.len() {
        return None;
    }
    let mut reordered = items.to_vec();
    reordered.swap(index, target);
    Some(reordered)
}

/// Rewrite every project's order to its 1-based position.
pub fn assign_display_order(projects: &mut [Project]) {
    for (position, project) in projects.iter_mut().enumerate() {
        project.display_order = Some(position as i32 + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_no_ops() {
        let items = vec!['a', 'b', 'c'];
        assert_eq!(swap_adjacent(&items, 0, Direction::Up), None);
        assert_eq!(swap_adjacent(&items, 2, Direction::Down), None);
        assert_eq!(swap_adjacent(&items, 7, Direction::Up), None);
        assert_eq!(swap_adjacent::<char>(&[], 0, Direction::Down), None);
    }

    #[test]
    fn down_then_up_restores_order() {
        let items = vec!['a', 'b', 'c', 'd'];
        for i in 0..items.len() - 1 {
            let moved = swap_adjacent(&items, i, Direction::Down).unwrap();
            assert_ne!(moved, items);
            let back = swap_adjacent(&moved, i + 1, Direction::Up).unwrap();
            assert_eq!(back, items);
        }
    }

    #[test]
    fn swap_touches_only_the_pair() {
        let items = vec!['a', 'b', 'c', 'd'];
        assert_eq!(
            swap_adjacent(&items, 2, Direction::Up).unwrap(),
            vec!['a', 'c', 'b', 'd']
        );
    }
}
