// broker/portfolio.rs

use std::cmp::{max, Ordering};

use crate::error::PortfolioError;
use crate::models::Position;

type Link = Option<Box<Node>>;

struct Node {
    position: Position,
    height: i32,
    left: Link,
    right: Link,
}

impl Node {
    fn new(position: Position) -> Self {
        Self {
            position,
            height: 1,
            left: None,
            right: None,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + max(height(&self.left), height(&self.right));
    }

    fn balance(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn height(link: &Link) -> i32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn balance_of(link: &Link) -> i32 {
    link.as_ref().map_or(0, |node| node.balance())
}

/// Holdings keyed by symbol, kept in an AVL tree so that lookups, buys and
/// sells stay logarithmic and the portfolio always lists in symbol order.
pub struct Portfolio {
    root: Link,
    len: usize,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new()
    }
}

impl Portfolio {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Rebuild a portfolio from positions that are already merged per symbol,
    /// e.g. rows of a saved ledger. Repeated symbols are merged.
    pub fn from_positions<I>(positions: I) -> Result<Self, PortfolioError>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut portfolio = Self::new();
        for position in positions {
            portfolio.insert_or_merge(&position.symbol, position.quantity, position.average_cost)?;
        }
        Ok(portfolio)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree, 0 when empty.
    pub fn height(&self) -> i32 {
        height(&self.root)
    }

    /// Record a buy. A new symbol gets its own position; an existing one has
    /// its quantity increased and its average cost re-weighted by notional.
    pub fn insert_or_merge(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: f64,
    ) -> Result<(), PortfolioError> {
        if symbol.trim().is_empty() {
            return Err(PortfolioError::InvalidArgument(
                "symbol must not be empty".to_string(),
            ));
        }
        // Ledger rows are read back trimmed.
        if symbol.trim() != symbol {
            return Err(PortfolioError::InvalidArgument(format!(
                "symbol '{}' has surrounding whitespace",
                symbol
            )));
        }
        if quantity == 0 {
            return Err(PortfolioError::InvalidArgument(format!(
                "quantity for {} must be positive",
                symbol
            )));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(PortfolioError::InvalidArgument(format!(
                "price for {} must be a non-negative number, got {}",
                symbol, price
            )));
        }

        match self.search(symbol) {
            Some(existing) => {
                let Some(total) = existing.quantity.checked_add(quantity) else {
                    return Err(PortfolioError::InvalidArgument(format!(
                        "quantity overflow for {}",
                        symbol
                    )));
                };
                if !merged_cost(existing, quantity, price, total).is_finite() {
                    return Err(PortfolioError::InvalidArgument(format!(
                        "average cost of {} overflows",
                        symbol
                    )));
                }
            }
            None => self.len += 1,
        }

        self.root = Some(insert(self.root.take(), symbol, quantity, price));
        Ok(())
    }

    pub fn search(&self, symbol: &str) -> Option<&Position> {
        let mut link = &self.root;
        while let Some(node) = link {
            match symbol.cmp(node.position.symbol.as_str()) {
                Ordering::Less => link = &node.left,
                Ordering::Greater => link = &node.right,
                Ordering::Equal => return Some(&node.position),
            }
        }
        None
    }

    /// Record a sell of `quantity` shares. Returns the position as it stood
    /// before the sell so the caller can price the trade against its cost.
    /// Selling the whole holding removes the symbol.
    pub fn reduce(&mut self, symbol: &str, quantity: u64) -> Result<Position, PortfolioError> {
        if quantity == 0 {
            return Err(PortfolioError::InvalidArgument(format!(
                "quantity for {} must be positive",
                symbol
            )));
        }

        let before = match self.search(symbol) {
            Some(position) => position.clone(),
            None => {
                return Err(PortfolioError::NotFound {
                    symbol: symbol.to_string(),
                })
            }
        };

        match before.quantity.cmp(&quantity) {
            Ordering::Less => {
                return Err(PortfolioError::InsufficientQuantity {
                    symbol: symbol.to_string(),
                    held: before.quantity,
                    requested: quantity,
                })
            }
            Ordering::Greater => {
                if let Some(position) = find_mut(&mut self.root, symbol) {
                    position.quantity -= quantity;
                }
            }
            Ordering::Equal => {
                self.root = remove(self.root.take(), symbol);
                self.len -= 1;
            }
        }

        Ok(before)
    }

    /// In-order walk over the holdings, ascending by symbol. Each call starts
    /// a fresh walk.
    pub fn ordered_snapshot(&self) -> Iter<'_> {
        Iter::new(&self.root)
    }

    /// Whether every node satisfies the AVL height and balance rules.
    pub fn is_balanced(&self) -> bool {
        fn check(link: &Link) -> Option<i32> {
            match link {
                None => Some(0),
                Some(node) => {
                    let left = check(&node.left)?;
                    let right = check(&node.right)?;
                    let expected = 1 + max(left, right);
                    if (left - right).abs() > 1 || node.height != expected {
                        return None;
                    }
                    Some(expected)
                }
            }
        }
        check(&self.root).is_some()
    }
}

impl<'a> IntoIterator for &'a Portfolio {
    type Item = &'a Position;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered_snapshot()
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn new(root: &'a Link) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left_spine(root.as_deref());
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<&'a Node>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Position;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.position)
    }
}

fn find_mut<'a>(link: &'a mut Link, symbol: &str) -> Option<&'a mut Position> {
    let node = link.as_mut()?;
    match symbol.cmp(node.position.symbol.as_str()) {
        Ordering::Less => find_mut(&mut node.left, symbol),
        Ordering::Greater => find_mut(&mut node.right, symbol),
        Ordering::Equal => Some(&mut node.position),
    }
}

// Right rotation around y: its left child x takes y's place.
fn rotate_right(mut y: Box<Node>) -> Box<Node> {
    let mut x = match y.left.take() {
        Some(x) => x,
        None => return y,
    };
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

fn rotate_left(mut x: Box<Node>) -> Box<Node> {
    let mut y = match x.right.take() {
        Some(y) => y,
        None => return x,
    };
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

fn merged_cost(held: &Position, quantity: u64, price: f64, total: u64) -> f64 {
    (held.notional() + price * quantity as f64) / total as f64
}

fn insert(link: Link, symbol: &str, quantity: u64, price: f64) -> Box<Node> {
    let mut node = match link {
        Some(node) => node,
        None => return Box::new(Node::new(Position::new(symbol, quantity, price))),
    };

    match symbol.cmp(node.position.symbol.as_str()) {
        Ordering::Less => node.left = Some(insert(node.left.take(), symbol, quantity, price)),
        Ordering::Greater => node.right = Some(insert(node.right.take(), symbol, quantity, price)),
        Ordering::Equal => {
            let position = &mut node.position;
            let total_quantity = position.quantity + quantity;
            position.average_cost = merged_cost(position, quantity, price, total_quantity);
            position.quantity = total_quantity;
            return node;
        }
    }

    rebalance_after_insert(node, symbol)
}

// After an insert the shape of the imbalance follows from where the new key
// landed relative to the heavy child.
fn rebalance_after_insert(mut node: Box<Node>, symbol: &str) -> Box<Node> {
    node.update_height();
    let balance = node.balance();

    if balance > 1 {
        let landed_right = node
            .left
            .as_ref()
            .map_or(false, |left| symbol > left.position.symbol.as_str());
        if landed_right {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        let landed_left = node
            .right
            .as_ref()
            .map_or(false, |right| symbol < right.position.symbol.as_str());
        if landed_left {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

fn remove(link: Link, symbol: &str) -> Link {
    let mut node = link?;

    match symbol.cmp(node.position.symbol.as_str()) {
        Ordering::Less => node.left = remove(node.left.take(), symbol),
        Ordering::Greater => node.right = remove(node.right.take(), symbol),
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, None) => return None,
            (Some(child), None) | (None, Some(child)) => return Some(child),
            (Some(left), Some(right)) => {
                let successor = min_position(&right).clone();
                node.left = Some(left);
                node.right = remove(Some(right), &successor.symbol);
                node.position = successor;
            }
        },
    }

    Some(rebalance_after_remove(node))
}

fn min_position(node: &Node) -> &Position {
    let mut current = node;
    while let Some(left) = current.left.as_deref() {
        current = left;
    }
    &current.position
}

// No single key explains the imbalance after a removal, so the heavy
// child's own balance picks single vs double rotation.
fn rebalance_after_remove(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let balance = node.balance();

    if balance > 1 {
        if balance_of(&node.left) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if balance_of(&node.right) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(portfolio: &Portfolio) -> Vec<String> {
        portfolio
            .ordered_snapshot()
            .map(|position| position.symbol.clone())
            .collect()
    }

    fn root_symbol(portfolio: &Portfolio) -> &str {
        portfolio
            .root
            .as_ref()
            .map(|node| node.position.symbol.as_str())
            .unwrap()
    }

    fn child_symbols(portfolio: &Portfolio) -> (Option<&str>, Option<&str>) {
        let root = portfolio.root.as_ref().unwrap();
        (
            root.left.as_ref().map(|n| n.position.symbol.as_str()),
            root.right.as_ref().map(|n| n.position.symbol.as_str()),
        )
    }

    fn buy_all(portfolio: &mut Portfolio, symbols: &[&str]) {
        for symbol in symbols {
            portfolio.insert_or_merge(symbol, 10, 100.0).unwrap();
            assert!(portfolio.is_balanced());
        }
    }

    #[test]
    fn ascending_inserts_rotate_left() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["A", "B", "C"]);
        assert_eq!(root_symbol(&portfolio), "B");
        assert_eq!(portfolio.height(), 2);
    }

    #[test]
    fn descending_inserts_rotate_right() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["C", "B", "A"]);
        assert_eq!(root_symbol(&portfolio), "B");
        assert_eq!(child_symbols(&portfolio), (Some("A"), Some("C")));
    }

    #[test]
    fn insert_left_right_case() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["C", "A", "B"]);
        assert_eq!(root_symbol(&portfolio), "B");
        assert_eq!(child_symbols(&portfolio), (Some("A"), Some("C")));
    }

    #[test]
    fn insert_right_left_case() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["A", "C", "B"]);
        assert_eq!(root_symbol(&portfolio), "B");
        assert_eq!(child_symbols(&portfolio), (Some("A"), Some("C")));
    }

    #[test]
    fn remove_left_right_case() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["C", "A", "D", "B"]);
        assert_eq!(root_symbol(&portfolio), "C");

        portfolio.reduce("D", 10).unwrap();

        assert!(portfolio.is_balanced());
        assert_eq!(root_symbol(&portfolio), "B");
        assert_eq!(child_symbols(&portfolio), (Some("A"), Some("C")));
        assert_eq!(portfolio.height(), 2);
    }

    #[test]
    fn remove_right_left_case() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["B", "A", "D", "C"]);

        portfolio.reduce("A", 10).unwrap();

        assert!(portfolio.is_balanced());
        assert_eq!(root_symbol(&portfolio), "C");
        assert_eq!(child_symbols(&portfolio), (Some("B"), Some("D")));
    }

    #[test]
    fn remove_with_evenly_balanced_child_uses_single_rotation() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["D", "B", "E", "A", "C"]);

        portfolio.reduce("E", 10).unwrap();

        assert!(portfolio.is_balanced());
        assert_eq!(root_symbol(&portfolio), "B");
        let right = portfolio.root.as_ref().unwrap().right.as_ref().unwrap();
        assert_eq!(right.position.symbol, "D");
        assert_eq!(right.left.as_ref().unwrap().position.symbol, "C");
        assert_eq!(portfolio.height(), 3);
    }

    #[test]
    fn remove_two_child_node_splices_successor() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["D", "B", "F", "A", "C", "E", "G"]);
        portfolio.insert_or_merge("E", 5, 130.0).unwrap();

        portfolio.reduce("D", 10).unwrap();

        assert!(portfolio.is_balanced());
        assert_eq!(root_symbol(&portfolio), "E");
        let root = portfolio.search("E").unwrap();
        assert_eq!(root.quantity, 15);
        assert_eq!(root.average_cost, 110.0);
        assert_eq!(symbols(&portfolio), vec!["A", "B", "C", "E", "F", "G"]);
        assert_eq!(portfolio.len(), 6);
    }

    #[test]
    fn partial_reduce_keeps_structure() {
        let mut portfolio = Portfolio::new();
        buy_all(&mut portfolio, &["B", "A", "C"]);

        let before = portfolio.reduce("A", 3).unwrap();

        assert_eq!(before.quantity, 10);
        assert_eq!(portfolio.search("A").unwrap().quantity, 7);
        assert_eq!(root_symbol(&portfolio), "B");
        assert_eq!(portfolio.len(), 3);
    }

    #[test]
    fn merge_does_not_add_nodes() {
        let mut portfolio = Portfolio::new();
        portfolio.insert_or_merge("AAPL", 2, 10.0).unwrap();
        portfolio.insert_or_merge("AAPL", 2, 20.0).unwrap();
        assert_eq!(portfolio.len(), 1);
        assert_eq!(portfolio.height(), 1);
        assert_eq!(portfolio.search("AAPL").unwrap().average_cost, 15.0);
    }

    #[test]
    fn rejects_bad_arguments_without_change() {
        let mut portfolio = Portfolio::new();
        portfolio.insert_or_merge("AAPL", 2, 10.0).unwrap();

        assert!(matches!(
            portfolio.insert_or_merge("", 1, 1.0),
            Err(PortfolioError::InvalidArgument(_))
        ));
        assert!(matches!(
            portfolio.insert_or_merge("AAPL", 0, 1.0),
            Err(PortfolioError::InvalidArgument(_))
        ));
        assert!(matches!(
            portfolio.insert_or_merge("AAPL", 1, -1.0),
            Err(PortfolioError::InvalidArgument(_))
        ));
        assert!(matches!(
            portfolio.insert_or_merge("AAPL", 1, f64::NAN),
            Err(PortfolioError::InvalidArgument(_))
        ));
        assert!(matches!(
            portfolio.insert_or_merge("AAPL", u64::MAX, 1.0),
            Err(PortfolioError::InvalidArgument(_))
        ));
        assert!(matches!(
            portfolio.reduce("AAPL", 0),
            Err(PortfolioError::InvalidArgument(_))
        ));

        assert_eq!(portfolio.search("AAPL"), Some(&Position::new("AAPL", 2, 10.0)));
        assert_eq!(portfolio.len(), 1);
    }

    #[test]
    fn rejects_padded_or_blank_symbols() {
        let mut portfolio = Portfolio::new();
        for symbol in [" ", "\t", "BRK B ", " AAPL"] {
            assert!(matches!(
                portfolio.insert_or_merge(symbol, 2, 10.0),
                Err(PortfolioError::InvalidArgument(_))
            ));
        }
        portfolio.insert_or_merge("BRK B", 2, 10.0).unwrap();
        assert_eq!(symbols(&portfolio), vec!["BRK B"]);
    }

    #[test]
    fn merge_that_overflows_average_cost_is_rejected() {
        let mut portfolio = Portfolio::new();
        portfolio.insert_or_merge("X", 1, 1e308).unwrap();

        assert!(matches!(
            portfolio.insert_or_merge("X", 10, 1e308),
            Err(PortfolioError::InvalidArgument(_))
        ));

        let held = portfolio.search("X").unwrap();
        assert_eq!(held.quantity, 1);
        assert_eq!(held.average_cost, 1e308);
        assert!(portfolio.is_balanced());
    }

    #[test]
    fn reduce_missing_symbol_is_not_found() {
        let mut portfolio = Portfolio::new();
        assert_eq!(
            portfolio.reduce("MSFT", 1),
            Err(PortfolioError::NotFound {
                symbol: "MSFT".to_string()
            })
        );
    }

    #[test]
    fn empty_portfolio() {
        let portfolio = Portfolio::default();
        assert!(portfolio.is_empty());
        assert_eq!(portfolio.height(), 0);
        assert_eq!(portfolio.ordered_snapshot().count(), 0);
        assert!(portfolio.is_balanced());
    }
}
