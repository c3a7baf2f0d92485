//! Page selector parsing.
//!
//! A selection is built from a list of selector strings. Each string may hold
//! several comma separated items:
//! - `"3"` - single page
//! - `"2-5"` - inclusive range
//! - `"4-"` - page 4 to the last page
//! - `"-3"` - first page to page 3
//! - `"odd"`, `"even"` - every odd or even page
//! - `"l"` - the last page (also usable as a range bound, `"3-l"`)
//! - `"l-2"` - two pages before the last (also a range bound, `"l-2-"`, `"-l-1"`)
//! - `"!2"`, `"n2-3"` - exclude pages
//!
//! A selection made only of exclusions starts from all pages.

use crate::pdf::PdfEngineError;

/// A parsed page selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    items: Vec<SelectionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectionItem {
    source: String,
    exclude: bool,
    pages: PageSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Page(u32),
    Last,
    LastMinus(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageSet {
    Range(Bound, Bound),
    Odd,
    Even,
}

impl Bound {
    fn resolve(self, page_count: u32) -> u32 {
        match self {
            Self::Page(n) => n,
            Self::Last => page_count,
            Self::LastMinus(n) => page_count.saturating_sub(n),
        }
    }
}

impl PageSet {
    fn contains(&self, page: u32, page_count: u32) -> bool {
        match self {
            Self::Range(start, end) => {
                page >= start.resolve(page_count) && page <= end.resolve(page_count)
            }
            Self::Odd => page % 2 == 1,
            Self::Even => page % 2 == 0,
        }
    }

    fn first_page(&self, page_count: u32) -> u32 {
        match self {
            Self::Range(start, _) => start.resolve(page_count),
            Self::Odd | Self::Even => 1,
        }
    }
}

impl PageSelection {
    /// Parse a list of selector strings.
    ///
    /// # Errors
    ///
    /// Returns [`PdfEngineError::InvalidSelector`] for malformed items, zero
    /// page numbers or descending ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use docbundle::pdf::PageSelection;
    ///
    /// let selection = PageSelection::parse(&["1-3".to_string(), "!2".to_string()]).unwrap();
    /// assert_eq!(selection.to_pages(5), vec![1, 3]);
    /// ```
    pub fn parse<S: AsRef<str>>(selectors: &[S]) -> Result<Self, PdfEngineError> {
        let mut items = Vec::new();

        for selector in selectors {
            for part in selector.as_ref().split(',') {
                let part: String = part.chars().filter(|c| !c.is_whitespace()).collect();
                if part.is_empty() {
                    continue;
                }
                items.push(parse_item(&part)?);
            }
        }

        if items.is_empty() {
            return Err(PdfEngineError::InvalidSelector {
                selector: selectors
                    .iter()
                    .map(|s| s.as_ref())
                    .collect::<Vec<&str>>()
                    .join(","),
                reason: "page selection cannot be empty".to_string(),
            });
        }

        Ok(Self { items })
    }

    /// Whether `page` (1-indexed) is selected in a document of `page_count` pages.
    pub fn contains(&self, page: u32, page_count: u32) -> bool {
        let only_exclusions = self.items.iter().all(|item| item.exclude);
        let mut selected = only_exclusions;

        for item in &self.items {
            if item.pages.contains(page, page_count) {
                selected = !item.exclude;
            }
        }

        selected
    }

    /// Selected pages of a document with `page_count` pages, in document order.
    pub fn to_pages(&self, page_count: u32) -> Vec<u32> {
        (1..=page_count)
            .filter(|page| self.contains(*page, page_count))
            .collect()
    }

    /// Check that every explicit page number exists in the document.
    ///
    /// # Errors
    ///
    /// Returns [`PdfEngineError::PageOutOfRange`] naming the first selector
    /// that starts past the last page.
    pub fn check_bounds(&self, page_count: u32) -> Result<(), PdfEngineError> {
        for item in &self.items {
            if item.pages.first_page(page_count) > page_count {
                return Err(PdfEngineError::PageOutOfRange {
                    selector: item.source.clone(),
                    page_count: page_count as usize,
                });
            }
        }
        Ok(())
    }
}

fn parse_item(part: &str) -> Result<SelectionItem, PdfEngineError> {
    let invalid = |reason: &str| PdfEngineError::InvalidSelector {
        selector: part.to_string(),
        reason: reason.to_string(),
    };

    let (exclude, body) = match part.strip_prefix(['!', 'n']) {
        Some(rest) => (true, rest),
        None => (false, part),
    };

    let pages = match body {
        "odd" => PageSet::Odd,
        "even" => PageSet::Even,
        _ => parse_range(body).map_err(|reason| invalid(&reason))?,
    };

    Ok(SelectionItem {
        source: part.to_string(),
        exclude,
        pages,
    })
}

fn parse_range(body: &str) -> Result<PageSet, String> {
    let (start, rest) = split_leading_bound(body);

    let Some(end) = rest.strip_prefix('-') else {
        if !rest.is_empty() {
            return Err("expected format like '1-5'".to_string());
        }
        let page = parse_bound(start)?;
        return Ok(PageSet::Range(page, page));
    };

    let start = if start.is_empty() {
        Bound::Page(1)
    } else {
        parse_bound(start)?
    };
    let end = if end.is_empty() {
        Bound::Last
    } else {
        parse_bound(end)?
    };

    if let (Bound::Page(s), Bound::Page(e)) = (start, end)
        && s > e
    {
        return Err("start page must be less than or equal to end page".to_string());
    }
    Ok(PageSet::Range(start, end))
}

/// Split `body` after its first bound. `l-N` is taken whole, so `"l-2-"`
/// splits into `("l-2", "-")`.
fn split_leading_bound(body: &str) -> (&str, &str) {
    if let Some(after) = body.strip_prefix("l-") {
        let digits = leading_digits(after);
        if digits > 0 {
            return body.split_at(2 + digits);
        }
    }
    if body.starts_with('l') {
        return body.split_at(1);
    }
    body.split_at(leading_digits(body))
}

fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

fn parse_bound(s: &str) -> Result<Bound, String> {
    if s == "l" {
        return Ok(Bound::Last);
    }

    if let Some(offset) = s.strip_prefix("l-") {
        let offset: u32 = offset
            .parse()
            .map_err(|_| format!("invalid offset from the last page: {s}"))?;
        return Ok(Bound::LastMinus(offset));
    }

    let page: u32 = s.parse().map_err(|_| format!("invalid page number: {s}"))?;
    if page == 0 {
        return Err("page numbers must be positive (1-indexed)".to_string());
    }
    Ok(Bound::Page(page))
}
