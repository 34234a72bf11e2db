//! # Focus Navigator
//!
//! Keyboard routing across the product grid and the sidebar.
//!
//! ## Field Layout
//! ```text
//! ┌───────────────────────────────────────────┐   ┌──────────────────────────┐
//! │  Product grid                             │   │  Sidebar                 │
//! │                                           │   │                          │
//! │          picked  original returns  price  │   │  Reserve   ◄── entry     │
//! │  row 0   [    ]  [    ]   [    ]   [    ] │   │  Cash 1000               │
//! │  row 1   [    ]  [    ]   [    ]   [    ] │   │  Cash 500                │
//! │  ...                                      │   │  ...                     │
//! │  row n-1 [    ]  [    ]   [    ]   [    ]─┼──►│  Cash 1                  │
//! │                                           │   │  Stall       Cleaning    │
//! └───────────────────────────────────────────┘   │  Electricity Gas         │
//!                                                 │  Parking     Goods       │
//!                                                 │  Bags        Others      │
//!                                                 │  LinePay     ServiceFee  │
//!                                                 └──────────────────────────┘
//! ```
//!
//! [`route`] is a pure function of the current field, the key and the grid
//! shape. It never touches ledger values; the caller focuses the returned
//! field and selects its full text, since every routable field is numeric.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cash::{Denomination, ExpenseCategory};
use crate::row::RowField;

// =============================================================================
// Keys & Targets
// =============================================================================

/// Keys that move focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum NavKey {
    Enter,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl NavKey {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_key_name(key: &str) -> Option<NavKey> {
        match key {
            "Enter" => Some(NavKey::Enter),
            "ArrowUp" => Some(NavKey::ArrowUp),
            "ArrowDown" => Some(NavKey::ArrowDown),
            "ArrowLeft" => Some(NavKey::ArrowLeft),
            "ArrowRight" => Some(NavKey::ArrowRight),
            _ => None,
        }
    }
}

/// A sidebar input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum SidebarField {
    Reserve,
    Cash(Denomination),
    Expense(ExpenseCategory),
}

/// The field that should receive input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "area", rename_all = "camelCase")]
pub enum FocusTarget {
    Grid { row: usize, column: RowField },
    Sidebar { field: SidebarField },
}

impl FocusTarget {
    /// The first sidebar field, reached when focus leaves the grid.
    pub const SIDEBAR_ENTRY: FocusTarget = FocusTarget::Sidebar {
        field: SidebarField::Reserve,
    };

    /// Shorthand for a grid cell.
    pub const fn grid(row: usize, column: RowField) -> Self {
        FocusTarget::Grid { row, column }
    }

    /// Shorthand for a sidebar field.
    pub const fn sidebar(field: SidebarField) -> Self {
        FocusTarget::Sidebar { field }
    }
}

/// The current shape of the product grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GridShape {
    pub rows: usize,
}

impl GridShape {
    pub const fn new(rows: usize) -> Self {
        GridShape { rows }
    }

    /// The grid's last row and last column, if the grid has rows.
    pub fn last_cell(&self) -> Option<FocusTarget> {
        self.rows
            .checked_sub(1)
            .map(|row| FocusTarget::grid(row, RowField::Price))
    }
}

// =============================================================================
// Routing
// =============================================================================

/// Routes a key press from `current` to the next field, or `None` when the
/// key leads nowhere.
///
/// The caller selects the whole text of the returned field so the next
/// keystroke replaces its value.
pub fn route(current: FocusTarget, key: NavKey, shape: GridShape) -> Option<FocusTarget> {
    match current {
        FocusTarget::Grid { row, column } => route_grid(row, column, key, shape),
        FocusTarget::Sidebar { field } => route_sidebar(field, key, shape),
    }
}

const LAST_COLUMN: usize = RowField::ORDER.len() - 1;

fn route_grid(row: usize, column: RowField, key: NavKey, shape: GridShape) -> Option<FocusTarget> {
    if row >= shape.rows {
        return None;
    }
    let last_row = shape.rows - 1;
    let col = column.index();

    match key {
        NavKey::Enter | NavKey::ArrowRight => {
            if col < LAST_COLUMN {
                RowField::from_index(col + 1).map(|next| FocusTarget::grid(row, next))
            } else if row < last_row {
                Some(FocusTarget::grid(row + 1, RowField::Picked))
            } else {
                Some(FocusTarget::SIDEBAR_ENTRY)
            }
        }
        NavKey::ArrowLeft => {
            if col > 0 {
                RowField::from_index(col - 1).map(|prev| FocusTarget::grid(row, prev))
            } else if row > 0 {
                Some(FocusTarget::grid(row - 1, RowField::Price))
            } else {
                None
            }
        }
        NavKey::ArrowUp => {
            if row > 0 {
                Some(FocusTarget::grid(row - 1, column))
            } else {
                Some(FocusTarget::SIDEBAR_ENTRY)
            }
        }
        NavKey::ArrowDown => {
            if row < last_row {
                Some(FocusTarget::grid(row + 1, column))
            } else {
                Some(FocusTarget::SIDEBAR_ENTRY)
            }
        }
    }
}

/// Explicit neighbours of a sidebar field. `None` means the key stays put,
/// except where [`route_sidebar`] sends it back to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SidebarLinks {
    next: Option<SidebarField>,
    prev: Option<SidebarField>,
    up: Option<SidebarField>,
    down: Option<SidebarField>,
}

/// The expense panel, two fields per line.
const EXPENSE_GRID: [[ExpenseCategory; 2]; 5] = [
    [ExpenseCategory::Stall, ExpenseCategory::Cleaning],
    [ExpenseCategory::Electricity, ExpenseCategory::Gas],
    [ExpenseCategory::Parking, ExpenseCategory::Goods],
    [ExpenseCategory::Bags, ExpenseCategory::Others],
    [ExpenseCategory::LinePay, ExpenseCategory::ServiceFee],
];

fn expense_position(category: ExpenseCategory) -> (usize, usize) {
    match category {
        ExpenseCategory::Stall => (0, 0),
        ExpenseCategory::Cleaning => (0, 1),
        ExpenseCategory::Electricity => (1, 0),
        ExpenseCategory::Gas => (1, 1),
        ExpenseCategory::Parking => (2, 0),
        ExpenseCategory::Goods => (2, 1),
        ExpenseCategory::Bags => (3, 0),
        ExpenseCategory::Others => (3, 1),
        ExpenseCategory::LinePay => (4, 0),
        ExpenseCategory::ServiceFee => (4, 1),
    }
}

fn expense_at(line: usize, col: usize) -> Option<SidebarField> {
    EXPENSE_GRID
        .get(line)
        .and_then(|pair| pair.get(col))
        .map(|c| SidebarField::Expense(*c))
}

fn links(field: SidebarField) -> SidebarLinks {
    let last_cash = SidebarField::Cash(Denomination::One);
    let first_expense = expense_at(0, 0);

    match field {
        SidebarField::Reserve => {
            let first_cash = Some(SidebarField::Cash(Denomination::Thousand));
            SidebarLinks {
                next: first_cash,
                prev: None,
                up: None,
                down: first_cash,
            }
        }
        SidebarField::Cash(denomination) => {
            let index = Denomination::ALL
                .iter()
                .position(|d| *d == denomination)
                .unwrap_or(0);
            let prev = match index {
                0 => Some(SidebarField::Reserve),
                i => Some(SidebarField::Cash(Denomination::ALL[i - 1])),
            };
            let next = match Denomination::ALL.get(index + 1) {
                Some(d) => Some(SidebarField::Cash(*d)),
                None => first_expense,
            };
            SidebarLinks { next, prev, up: prev, down: next }
        }
        SidebarField::Expense(category) => {
            let (line, col) = expense_position(category);
            let next = if col == 0 {
                expense_at(line, 1)
            } else {
                expense_at(line + 1, 0)
            };
            let prev = match (line, col) {
                (0, 0) => Some(last_cash),
                (_, 1) => expense_at(line, 0),
                (_, _) => expense_at(line - 1, 1),
            };
            let up = if line == 0 { Some(last_cash) } else { expense_at(line - 1, col) };
            let down = expense_at(line + 1, col);
            SidebarLinks { next, prev, up, down }
        }
    }
}

fn route_sidebar(field: SidebarField, key: NavKey, shape: GridShape) -> Option<FocusTarget> {
    let links = links(field);
    let target = match key {
        NavKey::Enter | NavKey::ArrowRight => links.next,
        NavKey::ArrowLeft => links.prev,
        NavKey::ArrowUp => links.up,
        NavKey::ArrowDown => links.down,
    };

    match target {
        Some(next) => Some(FocusTarget::sidebar(next)),
        // Top/left edge of the sidebar leads back into the grid.
        None if field == SidebarField::Reserve
            && matches!(key, NavKey::ArrowUp | NavKey::ArrowLeft) =>
        {
            shape.last_cell()
        }
        None => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
