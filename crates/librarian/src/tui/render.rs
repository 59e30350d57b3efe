use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block as RatatuiBlock, Borders, Padding, Paragraph, Wrap},
};
use tui_textarea::TextArea;

use super::spinner::frame_at;
use super::state::{HealthStatus, InteractionState};
use super::theme::{Meaning, Theme};
use super::view_model::{Blocks, Content};

/// Fixed card width for the TUI
const CARD_WIDTH: u16 = 72;

pub struct RenderContext<'a> {
    pub theme: &'a Theme,
    pub anchor_col: u16,
    pub textarea: &'a TextArea<'static>,
}

/// Calculate the height needed to render the current state.
pub fn calculate_needed_height(state: &InteractionState, theme: &Theme) -> u16 {
    let view = Blocks::from_state(state);
    let content_width = usize::from(CARD_WIDTH.saturating_sub(4)).max(1);

    content_height(&view, content_width, theme)
        .saturating_add(3) // borders (2) + top padding (1)
        .max(5)
}

/// Main render function: derives view model from state, then renders it
pub fn render(frame: &mut Frame, state: &InteractionState, ctx: &RenderContext) {
    // View model is always rebuilt from state
    let view = Blocks::from_state(state);

    render_view(frame, &view, state.health(), state.answer_scroll(), ctx);
}

fn health_meaning(health: HealthStatus) -> Meaning {
    match health {
        HealthStatus::Unknown | HealthStatus::Checking => Meaning::Annotation,
        HealthStatus::Ok => Meaning::Important,
        HealthStatus::Degraded => Meaning::AlertWarn,
        HealthStatus::Error => Meaning::AlertError,
    }
}

fn content_height(view: &Blocks, content_width: usize, theme: &Theme) -> u16 {
    let mut total_height = 0u16;
    for (idx, block) in view.items.iter().enumerate() {
        if idx > 0 {
            total_height = total_height.saturating_add(1); // separator
            total_height = total_height.saturating_add(1); // leading blank after separator
        }
        total_height = total_height.saturating_add(calculate_block_height(
            &block.content,
            content_width,
            theme,
        ));
    }
    total_height
}

fn render_view(
    frame: &mut Frame,
    view: &Blocks,
    health: HealthStatus,
    scroll_back: u16,
    ctx: &RenderContext,
) {
    let area = frame.area();

    // Fixed width, min 32 if terminal is narrow
    let desired_width = CARD_WIDTH.min(area.width.saturating_sub(2)).max(32);
    let content_width = usize::from(desired_width.saturating_sub(4)).max(1);

    // Position at anchor_col
    let max_x = area.x + area.width.saturating_sub(desired_width);
    let preferred_x = area.x + ctx.anchor_col.saturating_sub(2);

    let desired_height = content_height(view, content_width, ctx.theme)
        .saturating_add(3)
        .max(5);

    // Cap card height at viewport height. Overflow is scrolled so the end of
    // the response shows, unless the user paged back.
    let actual_height = desired_height.min(area.height);
    let scroll_offset = desired_height
        .saturating_sub(actual_height)
        .saturating_sub(scroll_back);

    let card = Rect {
        x: preferred_x.min(max_x),
        y: area.y,
        width: desired_width.min(area.width),
        height: actual_height,
    };

    let health_line = Line::from(Span::styled(
        format!(" {} ", view.health),
        ctx.theme.as_style(health_meaning(health)),
    ))
    .alignment(Alignment::Right);

    // Padding: left=1, right=1, top=1, bottom=0 (blocks have trailing blanks)
    let outer_block = RatatuiBlock::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", view.title))
        .title_top(health_line)
        .title_bottom(Line::from(view.footer).alignment(Alignment::Right))
        .border_style(ctx.theme.as_style(Meaning::Muted))
        .padding(Padding::new(1, 1, 1, 0));

    let inner_area = outer_block.inner(card);
    frame.render_widget(outer_block, card);

    render_blocks_content(frame, view, ctx, inner_area, card.width, scroll_offset);
}

fn render_blocks_content(
    frame: &mut Frame,
    view: &Blocks,
    ctx: &RenderContext,
    area: Rect,
    card_width: u16,
    scroll_offset: u16,
) {
    let content_width = usize::from(area.width).max(1);

    // Layout rows for full content: separator, leading blank, block
    let mut rows: Vec<u16> = Vec::new();
    for (idx, block) in view.items.iter().enumerate() {
        if idx > 0 {
            rows.push(1);
            rows.push(1);
        }
        rows.push(calculate_block_height(
            &block.content,
            content_width,
            ctx.theme,
        ));
    }

    if rows.is_empty() {
        return;
    }

    // Cumulative offsets to find which rows are visible after scrolling
    let mut cumulative: Vec<u16> = Vec::with_capacity(rows.len() + 1);
    let mut offset = 0u16;
    cumulative.push(offset);
    for height in &rows {
        offset = offset.saturating_add(*height);
        cumulative.push(offset);
    }

    let visible_end = scroll_offset.saturating_add(area.height);

    let mut row_idx = 0;
    for (idx, block) in view.items.iter().enumerate() {
        if idx > 0 {
            let sep_start = cumulative[row_idx];
            if sep_start >= scroll_offset && sep_start < visible_end {
                let sep_area = Rect {
                    x: area.x,
                    y: area.y + sep_start - scroll_offset,
                    width: area.width,
                    height: 1,
                };
                render_separator(frame, sep_area, ctx, card_width);
            }
            row_idx += 2; // separator and leading blank
        }

        let block_start = cumulative[row_idx];
        let block_end = cumulative[row_idx + 1];

        // Partially visible blocks are clipped to the viewport
        if block_start < visible_end && block_end > scroll_offset {
            let start = block_start.max(scroll_offset);
            let end = block_end.min(visible_end);

            let block_area = Rect {
                x: area.x,
                y: area.y + start - scroll_offset,
                width: area.width,
                height: end - start,
            };

            let skip = scroll_offset.saturating_sub(block_start);
            render_block_content(frame, &block.content, block_area, skip, ctx);
        }

        row_idx += 1;
    }
}

/// Render the content items of a block whose first `skip` rows are scrolled
/// off above `area`.
fn render_block_content(
    frame: &mut Frame,
    content: &[Content],
    area: Rect,
    mut skip: u16,
    ctx: &RenderContext,
) {
    let content_width = usize::from(area.width).max(1);
    let bottom = area.y.saturating_add(area.height);
    let mut y = area.y;

    for item in content {
        let height = calculate_single_content_height(item, content_width, ctx.theme);
        if skip >= height {
            skip -= height;
            continue;
        }
        if y >= bottom {
            break;
        }

        let visible = (height - skip).min(bottom - y);
        let item_area = Rect {
            x: area.x,
            y,
            width: area.width,
            height: visible,
        };
        render_single_content(frame, item, item_area, skip, ctx);

        y += visible;
        skip = 0;
    }
}

/// Render a single content item, starting `skip` wrapped rows in.
/// Symbol is rendered at column 0, text wraps in columns 2+ (offset area).
fn render_single_content(
    frame: &mut Frame,
    content: &Content,
    area: Rect,
    skip: u16,
    ctx: &RenderContext,
) {
    let text_area = Rect {
        x: area.x.saturating_add(2),
        y: area.y,
        width: area.width.saturating_sub(2),
        height: area.height,
    };
    let base = ctx.theme.as_style(Meaning::Base);

    match content {
        Content::Input { .. } => {
            if skip == 0 {
                render_symbol(
                    frame,
                    content.prefix_symbol(),
                    ctx.theme.as_style(Meaning::Guidance),
                    area,
                );
            }
            frame.render_widget(ctx.textarea, text_area);
        }

        Content::TopK { k } => {
            let line = Line::from(vec![
                Span::styled("Top-k: ", ctx.theme.as_style(Meaning::Annotation)),
                Span::styled(k.to_string(), ctx.theme.as_style(Meaning::Important)),
            ]);
            frame.render_widget(Paragraph::new(line), text_area);
        }

        Content::Presets { questions } => {
            let paragraph = Paragraph::new(preset_lines(questions, ctx.theme))
                .wrap(Wrap { trim: false })
                .scroll((skip, 0));
            frame.render_widget(paragraph, text_area);
        }

        Content::Spinner {
            frame: spinner_frame,
            status_text,
        } => {
            let style = ctx.theme.as_style(Meaning::Annotation);
            render_symbol(frame, frame_at(*spinner_frame), style, area);
            frame.render_widget(Paragraph::new(*status_text).style(style), text_area);
        }

        Content::Answer { markdown } => {
            let paragraph = Paragraph::new(Text::from(markdown_to_lines(markdown, ctx.theme)))
                .style(base)
                .wrap(Wrap { trim: false })
                .scroll((skip, 0));
            frame.render_widget(paragraph, text_area);
        }

        Content::Error { message } => {
            if skip == 0 {
                render_symbol(
                    frame,
                    content.prefix_symbol(),
                    ctx.theme.as_style(Meaning::AlertError),
                    area,
                );
            }

            let paragraph = Paragraph::new(message.as_str())
                .style(base)
                .wrap(Wrap { trim: false })
                .scroll((skip, 0));
            frame.render_widget(paragraph, text_area);
        }

        Content::Placeholder(text) => {
            let paragraph = Paragraph::new(*text).style(ctx.theme.as_style(Meaning::Muted));
            frame.render_widget(paragraph, text_area);
        }
    }
}

fn preset_lines(questions: &[&'static str], theme: &Theme) -> Vec<Line<'static>> {
    let number_style = theme.as_style(Meaning::Guidance);
    let text_style = theme.as_style(Meaning::Muted);

    questions
        .iter()
        .enumerate()
        .map(|(idx, question)| {
            Line::from(vec![
                Span::styled(format!("{}. ", idx + 1), number_style),
                Span::styled(*question, text_style),
            ])
        })
        .collect()
}

/// Render a single-character symbol at the start of an area
fn render_symbol(frame: &mut Frame, symbol: &str, style: Style, area: Rect) {
    let symbol_area = Rect {
        x: area.x,
        y: area.y,
        width: 1,
        height: 1,
    };
    frame.render_widget(Paragraph::new(symbol).style(style), symbol_area);
}

fn render_separator(frame: &mut Frame, area: Rect, ctx: &RenderContext, card_width: u16) {
    let style = ctx.theme.as_style(Meaning::Muted);

    // ├ + ─ repeated + ┤ spanning the full card width
    let inner_width = card_width.saturating_sub(2) as usize;
    let separator = format!("\u{251c}{}\u{2524}", "\u{2500}".repeat(inner_width));

    // Area is inside the padding; the border sits 2 columns to the left
    let sep_area = Rect {
        x: area.x.saturating_sub(2),
        y: area.y,
        width: card_width,
        height: 1,
    };
    frame.render_widget(Paragraph::new(Span::styled(separator, style)), sep_area);
}

/// Calculate total height for all content items in a block
fn calculate_block_height(content: &[Content], width: usize, theme: &Theme) -> u16 {
    let content_height: u16 = content
        .iter()
        .map(|c| calculate_single_content_height(c, width, theme))
        .sum();

    // Trailing blank line after the block
    content_height.saturating_add(1)
}

/// Calculate height for a single content item.
/// Uses ratatui's Paragraph::line_count for consistency with rendering.
fn calculate_single_content_height(content: &Content, width: usize, theme: &Theme) -> u16 {
    // Text area is offset by 2 for symbol column
    let text_width = width.saturating_sub(2);

    match content {
        // The textarea wraps by word, which can take more lines than character wrapping
        Content::Input { text } => {
            let (lines, last_line_width) = word_wrap_line_count_with_last_width(text, text_width);
            // Extra line for the cursor only when the last line is full
            if last_line_width >= text_width {
                lines.saturating_add(1)
            } else {
                lines
            }
        }
        Content::TopK { .. } | Content::Spinner { .. } | Content::Placeholder(_) => 1,
        Content::Presets { questions } => {
            lines_height(Text::from(preset_lines(questions, theme)), text_width)
        }
        Content::Answer { markdown } => {
            lines_height(Text::from(markdown_to_lines(markdown, theme)), text_width)
        }
        Content::Error { message } => lines_height(Text::from(message.as_str()), text_width),
    }
}

/// Count lines when text is wrapped at given width.
fn lines_height(text: Text<'_>, width: usize) -> u16 {
    if width == 0 {
        return 1;
    }

    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
    u16::try_from(paragraph.line_count(width as u16).max(1)).unwrap_or(u16::MAX)
}

/// Count lines using word wrapping (matches TextArea's WrapMode::Word).
/// Returns (line_count, last_line_width) so the caller can reserve a cursor line.
fn word_wrap_line_count_with_last_width(text: &str, width: usize) -> (u16, usize) {
    if width == 0 || text.is_empty() {
        return (1, 0);
    }

    let mut line_count = 0u16;
    let mut current_line_width = 0usize;

    for line in text.lines() {
        if line.trim().is_empty() {
            line_count += 1;
            current_line_width = 0;
            continue;
        }

        let mut line_started = false;

        for word in line.split_whitespace() {
            let word_width = unicode_width::UnicodeWidthStr::width(word);

            let fits = !line_started || current_line_width + 1 + word_width <= width;
            if line_started && fits {
                current_line_width += 1 + word_width;
                continue;
            }

            if line_started {
                // Word doesn't fit, the current line is done
                line_count += 1;
            }

            if word_width > width {
                // Longer than a line: split by character
                let full_lines = word_width / width;
                current_line_width = word_width % width;
                line_count += full_lines as u16;
                line_started = current_line_width > 0;
                if !line_started {
                    // Exactly filled its lines; the cursor sits on a full line
                    current_line_width = width;
                    line_count -= 1;
                    line_started = true;
                }
            } else {
                current_line_width = word_width;
                line_started = true;
            }
        }

        if line_started {
            line_count += 1;
        }
    }

    if line_count == 0 {
        line_count = 1;
        current_line_width = 0;
    }

    (line_count, current_line_width)
}

/// Convert a markdown answer to styled lines.
///
/// Handles the subset the backend produces: paragraphs, bold and emphasis,
/// inline and fenced code, headings and bullet or numbered lists.
pub fn markdown_to_lines(text: &str, theme: &Theme) -> Vec<Line<'static>> {
    let parser = Parser::new(text);
    let mut lines: Vec<Vec<Span<'static>>> = vec![Vec::new()];

    let base_style = theme.as_style(Meaning::Base);
    let code_style = theme.as_style(Meaning::Important);
    let bullet_style = theme.as_style(Meaning::Guidance);
    let mut style_stack: Vec<Style> = vec![base_style];
    let mut in_code_block = false;
    // One entry per open list: the next number, or None for bullets
    let mut list_stack: Vec<Option<u64>> = Vec::new();

    fn new_line(lines: &mut Vec<Vec<Span<'static>>>) {
        if lines.last().is_some_and(|line| !line.is_empty()) {
            lines.push(Vec::new());
        }
    }

    fn push_style(stack: &mut Vec<Style>, base: Style, modifier: Modifier) {
        let style = stack.last().copied().unwrap_or(base).add_modifier(modifier);
        stack.push(style);
    }

    for event in parser {
        match event {
            Event::Start(Tag::Strong) => push_style(&mut style_stack, base_style, Modifier::BOLD),
            Event::Start(Tag::Emphasis) => {
                push_style(&mut style_stack, base_style, Modifier::ITALIC)
            }
            Event::Start(Tag::Heading { .. }) => {
                new_line(&mut lines);
                push_style(&mut style_stack, base_style, Modifier::BOLD);
            }
            Event::End(TagEnd::Strong | TagEnd::Emphasis) => {
                style_stack.pop();
            }
            Event::End(TagEnd::Heading(_)) => {
                style_stack.pop();
                lines.push(Vec::new());
            }
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                new_line(&mut lines);
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                new_line(&mut lines);
            }
            Event::Start(Tag::List(start)) => {
                new_line(&mut lines);
                list_stack.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                list_stack.pop();
                new_line(&mut lines);
            }
            Event::Start(Tag::Item) => {
                new_line(&mut lines);
                let indent = "  ".repeat(list_stack.len().saturating_sub(1));
                let marker = match list_stack.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{indent}{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                if let Some(line) = lines.last_mut() {
                    line.push(Span::styled(marker, bullet_style));
                }
            }
            Event::Code(code) => {
                if let Some(line) = lines.last_mut() {
                    line.push(Span::styled(format!("`{code}`"), code_style));
                }
            }
            Event::Text(text) => {
                let current_style = if in_code_block {
                    code_style
                } else {
                    style_stack.last().copied().unwrap_or(base_style)
                };
                for (i, part) in text.split('\n').enumerate() {
                    if i > 0 {
                        lines.push(Vec::new());
                    }
                    if !part.is_empty()
                        && let Some(line) = lines.last_mut()
                    {
                        line.push(Span::styled(part.to_string(), current_style));
                    }
                }
            }
            Event::SoftBreak => {
                let current_style = style_stack.last().copied().unwrap_or(base_style);
                if let Some(line) = lines.last_mut() {
                    line.push(Span::styled(" ", current_style));
                }
            }
            Event::HardBreak => lines.push(Vec::new()),
            Event::Start(Tag::Paragraph) => {
                // Paragraphs outside lists are separated by a blank line
                if list_stack.is_empty() && lines.iter().any(|line| !line.is_empty()) {
                    new_line(&mut lines);
                    lines.push(Vec::new());
                }
            }
            _ => {}
        }
    }

    // Drop trailing blank lines
    while lines.len() > 1 && lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines.into_iter().map(Line::from).collect()
}
