use iced::widget::{button, column, container, row, text};
use iced::{Element, Length, Task, Theme};

mod editor;
mod imageio;
mod palette;
mod sound;

/// The three tool screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Gradient,
    Editor,
    SoundMachine,
}

impl Screen {
    const ALL: [Screen; 3] = [Screen::Gradient, Screen::Editor, Screen::SoundMachine];

    fn title(self) -> &'static str {
        match self {
            Screen::Gradient => "Gradient Maker",
            Screen::Editor => "Filter Editor",
            Screen::SoundMachine => "Sound Machine",
        }
    }
}

/// Main application state
struct PocketStudio {
    screen: Screen,
    /// Bumped on every navigation; screen messages carry the generation they
    /// were spawned under, and stale ones are dropped instead of delivered
    /// to a replacement screen instance
    generation: u64,
    gradient: palette::GradientMaker,
    editor: editor::FilterEditor,
    sound: sound::SoundMachine,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    Navigate(Screen),
    Gradient(u64, palette::Message),
    Editor(u64, editor::Message),
    Sound(u64, sound::Message),
}

impl PocketStudio {
    fn new() -> (Self, Task<Message>) {
        println!("🎨 Pocket Studio initialized");

        (
            PocketStudio {
                screen: Screen::Gradient,
                generation: 0,
                gradient: palette::GradientMaker::new(),
                editor: editor::FilterEditor::new(),
                sound: sound::SoundMachine::new(),
            },
            Task::none(),
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(target) => {
                if target == self.screen {
                    return Task::none();
                }

                // Each screen starts fresh: leaving one discards its state
                // and releases any live resources it held. The generation
                // bump orphans the old instance's in-flight tasks and notice
                // timers so their results never reach the fresh instance.
                match self.screen {
                    Screen::Gradient => self.gradient = palette::GradientMaker::new(),
                    Screen::Editor => self.editor = editor::FilterEditor::new(),
                    Screen::SoundMachine => {
                        self.sound.teardown();
                        self.sound = sound::SoundMachine::new();
                    }
                }
                self.generation += 1;

                self.screen = target;
                Task::none()
            }

            Message::Gradient(gen, msg) => {
                if gen != self.generation {
                    return Task::none();
                }
                self.gradient
                    .update(msg)
                    .map(move |m| Message::Gradient(gen, m))
            }
            Message::Editor(gen, msg) => {
                if gen != self.generation {
                    return Task::none();
                }
                self.editor
                    .update(msg)
                    .map(move |m| Message::Editor(gen, m))
            }
            Message::Sound(gen, msg) => {
                if gen != self.generation {
                    return Task::none();
                }
                self.sound.update(msg).map(move |m| Message::Sound(gen, m))
            }
        }
    }

    fn view(&self) -> Element<Message> {
        let mut nav = row![].spacing(12);
        for screen in Screen::ALL {
            nav = nav.push(
                button(text(screen.title()).size(14))
                    .on_press_maybe((screen != self.screen).then_some(Message::Navigate(screen)))
                    .padding(8),
            );
        }

        let gen = self.generation;
        let body = match self.screen {
            Screen::Gradient => self.gradient.view().map(move |m| Message::Gradient(gen, m)),
            Screen::Editor => self.editor.view().map(move |m| Message::Editor(gen, m)),
            Screen::SoundMachine => self.sound.view().map(move |m| Message::Sound(gen, m)),
        };

        container(column![nav, body].spacing(16).padding(16))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_pixel_analysis() -> palette::Analysis {
        palette::Analysis::new(
            imageio::LoadedImage {
                width: 1,
                height: 1,
                pixels: vec![255, 0, 0, 255],
            },
            vec!["#f00000".to_string()],
        )
    }

    #[test]
    fn stale_screen_results_are_dropped_after_navigation() {
        let (mut app, _) = PocketStudio::new();

        // An analysis task spawned by the first gradient screen instance,
        // completing only after the user has navigated away
        let stale = Message::Gradient(
            app.generation,
            palette::Message::Analyzed(Ok(red_pixel_analysis())),
        );

        let _ = app.update(Message::Navigate(Screen::Editor));
        let _ = app.update(stale);

        // The replacement instance never requested that analysis
        assert!(app.gradient.palette().is_empty());
    }

    #[test]
    fn current_generation_messages_deliver() {
        let (mut app, _) = PocketStudio::new();

        let fresh = Message::Gradient(
            app.generation,
            palette::Message::Analyzed(Ok(red_pixel_analysis())),
        );
        let _ = app.update(fresh);

        assert_eq!(app.gradient.palette(), ["#f00000".to_string()]);
    }

    #[test]
    fn navigation_resets_the_departed_screen() {
        let (mut app, _) = PocketStudio::new();

        let _ = app.update(Message::Gradient(
            app.generation,
            palette::Message::Analyzed(Ok(red_pixel_analysis())),
        ));
        assert!(!app.gradient.palette().is_empty());

        let _ = app.update(Message::Navigate(Screen::SoundMachine));

        assert_eq!(app.screen, Screen::SoundMachine);
        assert!(app.gradient.palette().is_empty());
    }
}

fn main() -> iced::Result {
    iced::application(
        "Pocket Studio",
        PocketStudio::update,
        PocketStudio::view,
    )
    .theme(PocketStudio::theme)
    .centered()
    .run_with(PocketStudio::new)
}
