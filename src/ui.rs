use mulquiz::leaderboard::Leaderboard;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const NAME_COLUMN_WIDTH: usize = 20;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);

        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);

        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let magenta_style = Style::default().fg(Color::Magenta);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2), // title
                Constraint::Min(1),    // body
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled("× multiplication quiz ×", magenta_style.patch(bold_style)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let game = &self.game;
        let mut lines: Vec<Line> = Vec::new();

        let legend = match self.screen {
            Screen::Start => {
                lines.push(Line::from(Span::styled(
                    format!(
                        "answer {} problems correctly as fast as you can",
                        game.target_correct()
                    ),
                    italic_style,
                )));
                lines.push(Line::default());
                lines.extend(leaderboard_lines(game.leaderboard(), bold_style, dim_bold_style));

                "(enter) start / (esc)ape"
            }
            Screen::Quiz => {
                let stats = game.stats();
                lines.push(Line::from(vec![
                    Span::styled(format!("✓ {}", stats.correct_count), green_bold_style),
                    Span::raw("   "),
                    Span::styled(format!("✗ {}", stats.wrong_count), red_bold_style),
                    Span::raw("   "),
                    Span::styled(
                        format!("{}/{}", stats.correct_count, game.target_correct()),
                        dim_bold_style,
                    ),
                    Span::raw("   "),
                    Span::styled(game.elapsed_display(), bold_style),
                ]));
                lines.push(Line::default());

                if let Some(problem) = game.current_problem() {
                    lines.push(Line::from(vec![
                        Span::styled(format!("{} = ", problem), bold_style),
                        Span::styled(
                            self.answer.clone(),
                            bold_style.add_modifier(Modifier::UNDERLINED),
                        ),
                        Span::styled("_", dim_bold_style),
                    ]));
                } else {
                    lines.push(Line::from(Span::styled("done!", green_bold_style)));
                }
                lines.push(Line::default());

                if let Some(ref feedback) = self.feedback {
                    let style = if feedback.positive {
                        green_bold_style
                    } else {
                        red_bold_style
                    };
                    lines.push(Line::from(Span::styled(feedback.message.clone(), style)));
                }

                "(enter) submit / (tab) skip / (esc)ape"
            }
            Screen::Results => {
                if let Some(attempt) = game.last_result() {
                    let stats = attempt.stats;
                    lines.push(Line::from(vec![
                        Span::styled("time ", dim_bold_style),
                        Span::styled(stats.time_string(), bold_style),
                        Span::styled("   answered ", dim_bold_style),
                        Span::styled(stats.total_answered().to_string(), bold_style),
                        Span::styled("   accuracy ", dim_bold_style),
                        Span::styled(format!("{}%", stats.accuracy_percent()), bold_style),
                    ]));
                    lines.push(Line::default());

                    if attempt.awaiting_name() {
                        lines.push(Line::from(Span::styled(
                            "🏆 New record! Enter your name:",
                            green_bold_style,
                        )));
                        lines.push(Line::from(vec![
                            Span::styled(
                                self.name.clone(),
                                bold_style.add_modifier(Modifier::UNDERLINED),
                            ),
                            Span::styled("_", dim_bold_style),
                        ]));
                        lines.push(Line::default());
                    }
                }

                if let Some(ref notice) = self.notice {
                    lines.push(Line::from(Span::styled(notice.clone(), italic_style)));
                    lines.push(Line::default());
                }

                lines.extend(leaderboard_lines(game.leaderboard(), bold_style, dim_bold_style));

                if game.last_result().is_some_and(|a| a.awaiting_name()) {
                    "(enter) save / (tab) skip saving / (esc)ape"
                } else {
                    "(r)estart / (enter) play again / (esc)ape"
                }
            }
        };

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }
}

fn leaderboard_lines(board: &Leaderboard, header: Style, row: Style) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("top 3", header))];

    if board.is_empty() {
        lines.push(Line::from(Span::styled("No high scores yet!", row)));
        return lines;
    }

    for (index, entry) in board.entries().iter().enumerate() {
        lines.push(Line::from(Span::styled(
            format!(
                "#{} {} {} {:>3}%",
                index + 1,
                pad_to_width(&entry.name, NAME_COLUMN_WIDTH),
                entry.time_string,
                entry.accuracy_percent
            ),
            row,
        )));
    }
    lines
}

/// Pads with spaces up to a display width; wide glyphs count double
fn pad_to_width(text: &str, width: usize) -> String {
    let used = text.width();
    if used >= width {
        return text.to_string();
    }
    format!("{}{}", text, " ".repeat(width - used))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use chrono::{DateTime, Utc};
    use mulquiz::{
        clock::Clock, problem::QuestionGenerator, runtime::ManualTickScheduler,
        store::MemoryStore, Game,
    };

    fn create_test_app(target: u32) -> App {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let game = Game::new(target, Box::new(MemoryStore::new()), Box::new(ManualTickScheduler::new()))
            .with_clock(Clock::fixed(start))
            .with_generator(QuestionGenerator::seeded(9));
        App::new(game, &Config::default())
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);

        app.render(area, &mut buffer);

        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_start_screen_shows_empty_board() {
        let app = create_test_app(20);
        let rendered = render(&app, 80, 24);

        assert!(rendered.contains("answer 20 problems"));
        assert!(rendered.contains("No high scores yet!"));
        assert!(rendered.contains("(enter) start"));
    }

    #[test]
    fn test_quiz_screen_shows_problem_and_answer() {
        let mut app = create_test_app(20);
        app.game.start().unwrap();
        app.screen = Screen::Quiz;
        app.answer = "42".to_string();

        let problem = *app.game.current_problem().unwrap();
        let rendered = render(&app, 80, 24);

        assert!(rendered.contains(&format!("{} =", problem)));
        assert!(rendered.contains("42"));
        assert!(rendered.contains("00:00"));
        assert!(rendered.contains("0/20"));
    }

    #[test]
    fn test_results_screen_after_record_saved() {
        let mut app = create_test_app(1);
        app.game.start().unwrap();
        let expected = app.game.current_problem().unwrap().expected();
        app.game.submit_answer(&expected.to_string()).unwrap();
        app.game.record_attempt("Ana").unwrap();
        app.screen = Screen::Results;

        let rendered = render(&app, 80, 24);

        assert!(rendered.contains("#1 Ana"));
        assert!(rendered.contains("100%"));
        assert!(rendered.contains("(r)estart"));
        assert!(!rendered.contains("New record"));
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let app = create_test_app(20);
        render(&app, 12, 6);
        render(&app, 1, 1);
    }

    #[test]
    fn test_pad_to_width() {
        assert_eq!(pad_to_width("Ana", 5), "Ana  ");
        assert_eq!(pad_to_width("toolong", 3), "toolong");
        assert_eq!(pad_to_width("日本", 6), "日本  ");
    }
}
