//! Static board layout consumed by front ends.

use super::{Priority, TaskStatus};
use serde::Serialize;

/// One priority section inside the todo column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSection {
    pub priority: Priority,
    pub title: &'static str,
}

/// One board column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub title: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<BoardSection>,
}

/// The full board: three columns, the first split into priority sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardConfiguration {
    pub columns: Vec<BoardColumn>,
}

/// Board layout. Archived tasks live off-board and are not a column.
pub fn board_configuration() -> BoardConfiguration {
    BoardConfiguration {
        columns: vec![
            BoardColumn {
                status: TaskStatus::Todo,
                title: "To Do",
                sections: vec![
                    BoardSection {
                        priority: Priority::ImportantUrgent,
                        title: "Important & Urgent",
                    },
                    BoardSection {
                        priority: Priority::ImportantNotUrgent,
                        title: "Important, Not Urgent",
                    },
                    BoardSection {
                        priority: Priority::NotImportantUrgent,
                        title: "Urgent, Not Important",
                    },
                ],
            },
            BoardColumn {
                status: TaskStatus::Doing,
                title: "Doing",
                sections: Vec::new(),
            },
            BoardColumn {
                status: TaskStatus::Done,
                title: "Done",
                sections: Vec::new(),
            },
        ],
    }
}
