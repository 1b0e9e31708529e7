use super::{BindStyle, Dialect, Paging};

/// ANSI SQL with named `:param` placeholders and `OFFSET ... FETCH` paging.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

impl Dialect for Generic {
    fn name(&self) -> &'static str {
        "default"
    }

    fn bind_style(&self) -> BindStyle {
        BindStyle::Named
    }

    fn paging(&self) -> Paging {
        Paging::OffsetFetch
    }

    fn supports_returning(&self) -> bool {
        false
    }
}
