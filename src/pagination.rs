/// Characters per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// How far (in chars) a page boundary may move to land after a space.
pub const BOUNDARY_WINDOW: usize = 50;

/// Split `text` into pages of roughly `page_size` chars.
///
/// Each tentative boundary is moved forward to just after the next space
/// within [`BOUNDARY_WINDOW`] chars, or failing that back to just after the
/// previous space within the same window. If neither exists the page is cut
/// at the tentative boundary. Concatenating the pages always yields `text`.
pub fn paginate(text: &str, page_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let page_size = page_size.max(1);

    let mut pages = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = page_end(&chars, start, page_size);
        pages.push(chars[start..end].iter().collect());
        start = end;
    }

    pages
}

fn page_end(chars: &[char], start: usize, page_size: usize) -> usize {
    let tentative = start + page_size;
    if tentative >= chars.len() {
        return chars.len();
    }

    if let Some(offset) = chars[tentative..]
        .iter()
        .take(BOUNDARY_WINDOW)
        .position(|&c| c == ' ')
    {
        return tentative + offset + 1;
    }

    // the backward search must stay inside the current page
    let lowest = tentative.saturating_sub(BOUNDARY_WINDOW - 1).max(start);
    if let Some(space) = (lowest..tentative).rev().find(|&idx| chars[idx] == ' ') {
        return space + 1;
    }

    tentative
}
