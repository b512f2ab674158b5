use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_PAGE_SIZE: i64 = 10;

/// Paginated data as returned by list-style methods.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pager {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub page_count: i64,
    #[serde(default)]
    pub is_last_page: bool,
    #[serde(default)]
    pub items: Value,
}

impl Pager {
    /// Build a pager, normalizing the requested page against `total`.
    ///
    /// A negative `total` means the count is unknown.
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        let page_size = if page_size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };

        let mut page = page;
        let mut page_count = -1;
        if total >= 0 {
            page_count = total / page_size + i64::from(total % page_size != 0);
            if page > page_count {
                page = page_count;
            }
        }
        page = page.max(1);
        page_count = page_count.max(0);

        Self {
            page,
            page_size,
            total_count: total,
            page_count,
            is_last_page: page >= page_count,
            items: Value::Null,
        }
    }

    pub fn set_items(&mut self, items: impl Into<Value>) -> &mut Self {
        self.items = items.into();
        self
    }
}
