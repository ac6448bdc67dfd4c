use crate::document::{BlockKind, Document, Node, Path, Text};
use crate::engine::{MemoryEngine, Point, Range};
use crate::render::{block_style, list_marker, text_format, BlockStyle};
use egui::text::{LayoutJob, TextFormat};
use egui::{CornerRadius, Frame, Margin, RichText, Sense, Ui, Visuals};
use std::sync::Arc;

const INDENT: f32 = 18.0;
const CODE_MARGIN: i8 = 6;
const CARET: &str = "▏";

/// Leaf ordinal and char offset. Orders like positions in the document.
type Position = (usize, usize);

struct RowLeaf<'a> {
    ordinal: usize,
    path: Path,
    text: &'a Text,
}

/// One drawn line: a run of sibling text leaves
struct Row<'a> {
    kind: BlockKind,
    quote_depth: usize,
    list_depth: usize,
    marker: Option<String>,
    leaves: Vec<RowLeaf<'a>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Nesting {
    quote_depth: usize,
    list_depth: usize,

    /// Set when the nodes being walked are items of this list
    list: Option<BlockKind>,
}

#[derive(Default)]
struct Walk<'a> {
    prefix: Path,
    next_leaf: usize,
    rows: Vec<Row<'a>>,
}

impl<'a> Walk<'a> {
    fn push_row(&mut self, kind: BlockKind, nesting: Nesting, marker: Option<String>, leaves: Vec<RowLeaf<'a>>) {
        if leaves.is_empty() {
            return;
        }
        self.rows.push(Row {
            kind,
            quote_depth: nesting.quote_depth,
            list_depth: nesting.list_depth,
            marker,
            leaves,
        });
    }
}

fn collect_rows<'a>(
    nodes: &'a [Node],
    kind: BlockKind,
    nesting: Nesting,
    mut marker: Option<String>,
    walk: &mut Walk<'a>,
) {
    let mut leaves = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        walk.prefix.push(index);
        match node {
            Node::Text(text) => {
                leaves.push(RowLeaf {
                    ordinal: walk.next_leaf,
                    path: walk.prefix.clone(),
                    text,
                });
                walk.next_leaf += 1;
            }
            Node::Element(element) => {
                walk.push_row(kind, nesting, marker.take(), std::mem::take(&mut leaves));

                let child_marker = match nesting.list {
                    Some(list) => Some(list_marker(list, index)),
                    None => marker.take(),
                };
                let child = Nesting {
                    quote_depth: nesting.quote_depth + usize::from(element.kind == BlockKind::BlockQuote),
                    list_depth: nesting.list_depth + usize::from(element.kind.is_list()),
                    list: element.kind.is_list().then_some(element.kind),
                };
                collect_rows(&element.children, element.kind, child, child_marker, walk);
            }
        }
        walk.prefix.pop();
    }
    walk.push_row(kind, nesting, marker, leaves);
}

fn rows(doc: &Document) -> Vec<Row<'_>> {
    let mut walk = Walk::default();
    collect_rows(&doc.children, BlockKind::Default, Nesting::default(), None, &mut walk);
    walk.rows
}

/// Selection as seen by the view
#[derive(Debug, Clone, Copy)]
struct Highlight {
    start: Position,
    end: Position,
    focus: Position,
}

impl Highlight {
    fn from_range(doc: &Document, range: &Range) -> Option<Self> {
        let paths = doc.leaf_paths();
        let position = |point: &Point| {
            paths
                .iter()
                .position(|path| *path == point.path)
                .map(|leaf| (leaf, point.offset))
        };
        let anchor = position(&range.anchor)?;
        let focus = position(&range.focus)?;
        Some(Self {
            start: anchor.min(focus),
            end: anchor.max(focus),
            focus,
        })
    }

    /// Selected char range inside a leaf of length `len`
    fn within(&self, ordinal: usize, len: usize) -> (usize, usize) {
        let bound = |(leaf, offset): Position| match leaf.cmp(&ordinal) {
            std::cmp::Ordering::Less => 0,
            std::cmp::Ordering::Equal => offset.min(len),
            std::cmp::Ordering::Greater => len,
        };
        let from = bound(self.start);
        (from, bound(self.end).max(from))
    }
}

/// Where a run of leaf chars landed in the layout job
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    job_start: usize,
    leaf: usize,
    offset: usize,
    len: usize,
}

fn span_position(spans: &[Span], index: usize) -> Option<Position> {
    spans
        .iter()
        .find(|span| span.job_start <= index && index <= span.job_start + span.len)
        .or_else(|| spans.last())
        .map(|span| {
            let into = index.saturating_sub(span.job_start).min(span.len);
            (span.leaf, span.offset + into)
        })
}

fn layout_row(
    row: &Row<'_>,
    highlight: Option<&Highlight>,
    style: &BlockStyle,
    visuals: &Visuals,
    wrap_width: f32,
) -> (LayoutJob, Vec<Span>) {
    let mut job = LayoutJob::default();
    job.wrap.max_width = wrap_width;
    let mut spans = Vec::new();
    let mut job_chars = 0;

    for leaf in &row.leaves {
        let format = text_format(leaf.text.marks, style, visuals);
        let chars: Vec<char> = leaf.text.text.chars().collect();
        let len = chars.len();
        let (from, to) = highlight.map_or((0, 0), |h| h.within(leaf.ordinal, len));
        let caret = highlight
            .map(|h| h.focus)
            .filter(|(ordinal, _)| *ordinal == leaf.ordinal)
            .map(|(_, offset)| offset.min(len));

        let mut cuts = vec![0, from, to, len];
        cuts.extend(caret);
        cuts.sort_unstable();
        cuts.dedup();

        if len == 0 {
            spans.push(Span {
                job_start: job_chars,
                leaf: leaf.ordinal,
                offset: 0,
                len: 0,
            });
        }
        for window in cuts.windows(2) {
            let (a, b) = (window[0], window[1]);
            if caret == Some(a) {
                job_chars += append_caret(&mut job, &format, visuals);
            }
            let mut segment_format = format.clone();
            if from < to && a >= from && b <= to {
                segment_format.background = visuals.selection.bg_fill;
            }
            let segment: String = chars[a..b].iter().collect();
            job.append(&segment, 0.0, segment_format);
            spans.push(Span {
                job_start: job_chars,
                leaf: leaf.ordinal,
                offset: a,
                len: b - a,
            });
            job_chars += b - a;
        }
        if caret == Some(len) {
            job_chars += append_caret(&mut job, &format, visuals);
        }
    }

    // Keep empty blocks one line tall
    if job.text.is_empty() {
        let format = text_format(Default::default(), style, visuals);
        job.append(" ", 0.0, format);
    }
    (job, spans)
}

fn append_caret(job: &mut LayoutJob, format: &TextFormat, visuals: &Visuals) -> usize {
    job.append(
        CARET,
        0.0,
        TextFormat {
            font_id: format.font_id.clone(),
            color: visuals.strong_text_color(),
            ..Default::default()
        },
    );
    CARET.chars().count()
}

/// Paint a row's text. Returns the clicked position, if any.
fn paint_job(ui: &mut Ui, job: LayoutJob, spans: &[Span]) -> Option<Position> {
    let galley = ui.fonts(|fonts| fonts.layout_job(job));
    let (rect, response) = ui.allocate_exact_size(galley.size(), Sense::click());
    ui.painter()
        .galley(rect.min, Arc::clone(&galley), ui.visuals().text_color());

    if !response.clicked() {
        return None;
    }
    let pointer = response.interact_pointer_pos()?;
    let index = galley.cursor_from_pos(pointer - rect.min).ccursor.index;
    span_position(spans, index)
}

fn show_row(ui: &mut Ui, row: &Row<'_>, highlight: Option<&Highlight>, visuals: &Visuals) -> Option<Position> {
    let style = block_style(row.kind);
    ui.horizontal(|ui| {
        ui.add_space(INDENT * row.list_depth as f32);
        for _ in 0..row.quote_depth {
            ui.label(RichText::new("┃").color(visuals.weak_text_color()));
        }
        if let Some(marker) = &row.marker {
            ui.label(RichText::new(marker).size(style.font_size));
        }

        if style.framed {
            let wrap_width = ui.available_width() - 2.0 * f32::from(CODE_MARGIN);
            let (job, spans) = layout_row(row, highlight, &style, visuals, wrap_width);
            Frame::NONE
                .fill(visuals.code_bg_color)
                .inner_margin(Margin::same(CODE_MARGIN))
                .corner_radius(CornerRadius::same(4))
                .show(ui, |ui| paint_job(ui, job, &spans))
                .inner
        } else {
            let (job, spans) = layout_row(row, highlight, &style, visuals, ui.available_width());
            paint_job(ui, job, &spans)
        }
    })
    .inner
}

/// Draw the document with its selection. A click moves the caret,
/// shift-click extends the selection.
pub fn show_document(ui: &mut Ui, engine: &mut MemoryEngine) {
    let visuals = ui.visuals().clone();
    let range = engine.selection();
    let doc = engine.document();
    let highlight = range.as_ref().and_then(|range| Highlight::from_range(doc, range));

    let mut clicked: Option<Point> = None;
    for row in rows(doc) {
        if let Some((leaf, offset)) = show_row(ui, &row, highlight.as_ref(), &visuals) {
            clicked = row
                .leaves
                .iter()
                .find(|candidate| candidate.ordinal == leaf)
                .map(|candidate| Point::new(candidate.path.clone(), offset));
        }
        ui.add_space(4.0);
    }

    if let Some(point) = clicked {
        let extend = ui.input(|i| i.modifiers.shift);
        let target = match range {
            Some(range) if extend => Range::new(range.anchor, point),
            _ => Range::collapsed(point),
        };
        engine.select(&target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Element, Marks};

    fn list_doc() -> Document {
        Document::new(vec![
            Element::with_text(BlockKind::HeadingOne, "Title").into(),
            Element::new(
                BlockKind::NumberedList,
                vec![
                    Element::with_text(BlockKind::ListItem, "one").into(),
                    Element::with_text(BlockKind::ListItem, "two").into(),
                ],
            )
            .into(),
            Element::new(
                BlockKind::BlockQuote,
                vec![Element::new(
                    BlockKind::Paragraph,
                    vec![
                        Text::new("plain ").into(),
                        Text::with_marks("bold", Marks::none().with(crate::document::Mark::Bold)).into(),
                    ],
                )
                .into()],
            )
            .into(),
        ])
    }

    #[test]
    fn test_rows_follow_blocks() {
        let doc = list_doc();
        let rows = rows(&doc);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].kind, BlockKind::HeadingOne);
        assert_eq!(rows[0].marker, None);

        assert_eq!(rows[1].kind, BlockKind::ListItem);
        assert_eq!(rows[1].marker.as_deref(), Some("1."));
        assert_eq!(rows[2].marker.as_deref(), Some("2."));
        assert_eq!(rows[2].list_depth, 1);

        assert_eq!(rows[3].quote_depth, 1);
        assert_eq!(rows[3].leaves.len(), 2);
        assert_eq!(rows[3].leaves[1].ordinal, 4);
        assert_eq!(rows[3].leaves[1].path, vec![2, 0, 1]);
    }

    #[test]
    fn test_highlight_within_leaves() {
        let doc = list_doc();
        let range = Range::new(Point::new(vec![1, 1, 0], 2), Point::new(vec![1, 0, 0], 1));
        let highlight = Highlight::from_range(&doc, &range).unwrap();

        assert_eq!(highlight.start, (1, 1));
        assert_eq!(highlight.end, (2, 2));
        assert_eq!(highlight.focus, (1, 1));
        assert_eq!(highlight.within(0, 5), (5, 5));
        assert_eq!(highlight.within(1, 3), (1, 3));
        assert_eq!(highlight.within(2, 3), (0, 2));
        assert_eq!(highlight.within(3, 3), (0, 0));
    }

    #[test]
    fn test_layout_places_caret_and_maps_clicks() {
        let doc = list_doc();
        let rows = rows(&doc);
        let highlight = Highlight {
            start: (3, 2),
            end: (3, 2),
            focus: (3, 2),
        };
        let style = block_style(BlockKind::Paragraph);
        let (job, spans) = layout_row(&rows[3], Some(&highlight), &style, &Visuals::dark(), 400.0);

        assert_eq!(job.text, format!("pl{}ain bold", CARET));
        // Before the caret, right after it, and inside the second leaf
        assert_eq!(span_position(&spans, 1), Some((3, 1)));
        assert_eq!(span_position(&spans, 3), Some((3, 2)));
        assert_eq!(span_position(&spans, 9), Some((4, 2)));
        assert_eq!(span_position(&spans, 100), Some((4, 4)));
    }

    #[test]
    fn test_empty_block_keeps_a_line() {
        let doc = Document::new(vec![Element::with_text(BlockKind::Paragraph, "").into()]);
        let rows = rows(&doc);
        let (job, spans) = layout_row(&rows[0], None, &block_style(BlockKind::Paragraph), &Visuals::dark(), 400.0);

        assert_eq!(job.text, " ");
        assert_eq!(span_position(&spans, 0), Some((0, 0)));
    }
}
