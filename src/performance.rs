use crate::error::PortfolioError;
use crate::models::TradeRecord;

/// Completed sells ranked by realized profit, stored as an array-backed
/// max-heap.
#[derive(Debug, Clone, Default)]
pub struct PerformanceHeap {
    heap: Vec<TradeRecord>,
}

fn parent(i: usize) -> usize {
    (i - 1) / 2
}

fn left_child(i: usize) -> usize {
    2 * i + 1
}

fn right_child(i: usize) -> usize {
    2 * i + 2
}

impl PerformanceHeap {
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Record a completed trade.
    pub fn insert(
        &mut self,
        symbol: &str,
        quantity: u64,
        profit: f64,
    ) -> Result<(), PortfolioError> {
        self.push(TradeRecord::new(symbol, quantity, profit))
    }

    pub fn push(&mut self, record: TradeRecord) -> Result<(), PortfolioError> {
        if record.symbol.is_empty() {
            return Err(PortfolioError::InvalidArgument(
                "trade symbol must not be empty".to_string(),
            ));
        }
        if record.quantity_sold == 0 {
            return Err(PortfolioError::InvalidArgument(format!(
                "quantity sold of {} must be positive",
                record.symbol
            )));
        }
        if !record.realized_profit.is_finite() {
            return Err(PortfolioError::InvalidArgument(format!(
                "profit of {} must be a finite number",
                record.symbol
            )));
        }

        self.heap.push(record);
        self.sift_up(self.heap.len() - 1);
        Ok(())
    }

    /// The most profitable trade, if any.
    pub fn peek_max(&self) -> Option<&TradeRecord> {
        self.heap.first()
    }

    pub fn extract_max(&mut self) -> Result<TradeRecord, PortfolioError> {
        if self.heap.is_empty() {
            return Err(PortfolioError::Empty);
        }
        let max = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Ok(max)
    }

    /// All trades, most profitable first. The heap itself is left as is.
    pub fn sorted_view(&self) -> Vec<TradeRecord> {
        let mut records = self.heap.clone();
        records.sort_by(|a, b| b.realized_profit.total_cmp(&a.realized_profit));
        records
    }

    /// Trades in heap storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, TradeRecord> {
        self.heap.iter()
    }

    fn sift_up(&mut self, mut index: usize) {
        while index != 0 {
            let parent_index = parent(index);
            if self.heap[index].realized_profit > self.heap[parent_index].realized_profit {
                self.heap.swap(index, parent_index);
                index = parent_index;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = left_child(index);
            let right = right_child(index);
            let mut largest = index;
            if left < len && self.heap[left].realized_profit > self.heap[largest].realized_profit {
                largest = left;
            }
            if right < len && self.heap[right].realized_profit > self.heap[largest].realized_profit
            {
                largest = right;
            }
            if largest == index {
                break;
            }
            self.heap.swap(index, largest);
            index = largest;
        }
    }
}
