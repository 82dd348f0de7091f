//! Buttons: packets bound to the touch protocol
//!
//! Every touch on a button runs through three phases:
//!
//! ```text
//! main_touch_start ──► main_touch_secondary* ──► main_touch_end
//!   (primary send)       (stay / circle / press)     (release)
//! ```
//!
//! Meta and switch buttons send nothing; their touches arrive as
//! [`MultiTouchPhase`] events that drive the modal state instead.
//!
//! Layouts keep one template per button and call [`Button::instantiate`] for
//! every board that shows it. Configuration is shared behind `Arc`, touch
//! state (counters, toggles, captured text) is fresh per instance.

use super::error::BoardError;
use super::meta::{MetaLevel, MetaType};
use super::packet::Packet;
use crate::codetext::ModifyText;
use crate::connection::{AutoSpace, Feedback, SoftBoardListener};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Secondary fired by keeping the finger on the button
pub const ON_STAY: i32 = -1;
/// Secondary fired by circling on the button
pub const ON_CIRCLE: i32 = 1;
/// Secondary fired by pressing harder
pub const ON_HARD_PRESS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiTouchPhase {
    Press,
    Release,
    Cancel,
}

/// A packet sent by a button instance, remembered for undo
#[derive(Debug, Clone, Copy, Default)]
struct Sent {
    counter: Option<u64>,
}

impl Sent {
    fn record(&mut self, listener: &dyn SoftBoardListener) {
        self.counter = Some(listener.get_process_counter());
    }

    /// Undoes the last send, provided nothing was edited after it
    fn undo(&mut self, listener: &mut dyn SoftBoardListener) -> bool {
        match self.counter.take() {
            Some(counter) if listener.check_process_counter(counter) => {
                listener.undo_sent_string()
            }
            _ => false,
        }
    }

    fn is_current(&self, listener: &dyn SoftBoardListener) -> bool {
        self.counter
            .is_some_and(|counter| listener.check_process_counter(counter))
    }
}

#[derive(Debug)]
pub struct Single {
    packet: Arc<Packet>,
}

#[derive(Debug)]
pub struct Double {
    packets: Arc<[Packet; 2]>,
    window: Duration,
    // Taps in the current double-tap run; odd means the second packet is out
    counter: u32,
    last_touch: Option<Instant>,
    sent: Sent,
}

#[derive(Debug)]
pub struct Alternate {
    packets: Arc<[Packet; 2]>,
    second: bool,
    sent: Sent,
}

#[derive(Debug)]
pub struct ListRoll {
    modify: ModifyText,
    auto_space: AutoSpace,
    alternate: Option<Packet>,
}

#[derive(Debug)]
pub struct List {
    roll: Arc<ListRoll>,
    sent: Sent,
    alternate_sent: bool,
}

#[derive(Debug)]
pub struct Multi {
    packets: Arc<[Packet]>,
    current: usize,
    sent: Sent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryState {
    Empty,
    /// Capturing typed text
    Armed,
    Holding(String),
}

#[derive(Debug)]
pub struct Memory {
    state: MemoryState,
    sent: bool,
}

/// What a space-travel button has delivered in the current touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelDone {
    Nothing,
    Space,
    Secondary,
    Failed,
}

#[derive(Debug)]
pub struct SpaceTravel {
    packets: Arc<[Packet; 2]>,
    done: TravelDone,
}

#[derive(Debug)]
pub struct Meta {
    meta: MetaType,
}

#[derive(Debug)]
pub struct Switch {
    board: Arc<str>,
}

#[derive(Debug)]
pub enum ButtonKind {
    Single(Single),
    Double(Double),
    Alternate(Alternate),
    List(List),
    Multi(Multi),
    Memory(Memory),
    SpaceTravel(SpaceTravel),
    Meta(Meta),
    Switch(Switch),
}

#[derive(Debug)]
pub struct Button {
    title: Option<Arc<str>>,
    on_circle: bool,
    kind: ButtonKind,
}

impl Button {
    fn from_kind(kind: ButtonKind) -> Self {
        Self {
            title: None,
            on_circle: false,
            kind,
        }
    }

    pub fn single(packet: Packet) -> Self {
        Self::from_kind(ButtonKind::Single(Single {
            packet: Arc::new(packet),
        }))
    }

    /// Second packet replaces the first when tapped again within `window`
    pub fn double(first: Packet, second: Packet, window: Duration) -> Self {
        Self::from_kind(ButtonKind::Double(Double {
            packets: Arc::new([first, second]),
            window,
            counter: 0,
            last_touch: None,
            sent: Sent::default(),
        }))
    }

    /// Secondary swaps the sent packet for the other one
    pub fn alternate(first: Packet, second: Packet) -> Self {
        Self::from_kind(ButtonKind::Alternate(Alternate {
            packets: Arc::new([first, second]),
            second: false,
            sent: Sent::default(),
        }))
    }

    /// Repeated taps cycle the text before the cursor through `roll`
    pub fn list(
        roll: Vec<String>,
        auto_space: AutoSpace,
        alternate: Option<Packet>,
    ) -> Result<Self, BoardError> {
        let modify = ModifyText::single(roll)?;
        Ok(Self::from_kind(ButtonKind::List(List {
            roll: Arc::new(ListRoll {
                modify,
                auto_space,
                alternate,
            }),
            sent: Sent::default(),
            alternate_sent: false,
        })))
    }

    /// Secondary advances through `packets`, wrapping around
    pub fn multi(packets: Vec<Packet>) -> Result<Self, BoardError> {
        if packets.is_empty() {
            return Err(BoardError::InvalidExternalData(
                "multi button without packets".to_string(),
            ));
        }
        Ok(Self::from_kind(ButtonKind::Multi(Multi {
            packets: packets.into(),
            current: 0,
            sent: Sent::default(),
        })))
    }

    pub fn memory() -> Self {
        Self::from_kind(ButtonKind::Memory(Memory {
            state: MemoryState::Empty,
            sent: false,
        }))
    }

    /// Sends `space`; secondary or leaving the button swaps it for `alternate`
    pub fn space_travel(space: Packet, alternate: Packet) -> Self {
        Self::from_kind(ButtonKind::SpaceTravel(SpaceTravel {
            packets: Arc::new([space, alternate]),
            done: TravelDone::Nothing,
        }))
    }

    /// Meta button from a raw meta type number
    pub fn meta(meta_type: i32) -> Result<Self, BoardError> {
        let meta = MetaType::try_from(meta_type)?;
        Ok(Self::meta_of(meta))
    }

    pub fn meta_of(meta: MetaType) -> Self {
        Self::from_kind(ButtonKind::Meta(Meta { meta }))
    }

    pub fn switch(board: impl Into<Arc<str>>) -> Self {
        Self::from_kind(ButtonKind::Switch(Switch {
            board: board.into(),
        }))
    }

    pub fn with_title(mut self, title: impl Into<Arc<str>>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Secondary fires on circle gestures instead of on stay
    pub fn with_on_circle(mut self, on_circle: bool) -> Self {
        self.on_circle = on_circle;
        self
    }

    pub fn kind(&self) -> &ButtonKind {
        &self.kind
    }

    pub fn is_on_circle(&self) -> bool {
        self.on_circle
    }

    /// Fresh instance sharing this button's configuration
    pub fn instantiate(&self) -> Button {
        let kind = match &self.kind {
            ButtonKind::Single(single) => ButtonKind::Single(Single {
                packet: Arc::clone(&single.packet),
            }),
            ButtonKind::Double(double) => ButtonKind::Double(Double {
                packets: Arc::clone(&double.packets),
                window: double.window,
                counter: 0,
                last_touch: None,
                sent: Sent::default(),
            }),
            ButtonKind::Alternate(alternate) => ButtonKind::Alternate(Alternate {
                packets: Arc::clone(&alternate.packets),
                second: false,
                sent: Sent::default(),
            }),
            ButtonKind::List(list) => ButtonKind::List(List {
                roll: Arc::clone(&list.roll),
                sent: Sent::default(),
                alternate_sent: false,
            }),
            ButtonKind::Multi(multi) => ButtonKind::Multi(Multi {
                packets: Arc::clone(&multi.packets),
                current: 0,
                sent: Sent::default(),
            }),
            ButtonKind::Memory(_) => ButtonKind::Memory(Memory {
                state: MemoryState::Empty,
                sent: false,
            }),
            ButtonKind::SpaceTravel(travel) => ButtonKind::SpaceTravel(SpaceTravel {
                packets: Arc::clone(&travel.packets),
                done: TravelDone::Nothing,
            }),
            ButtonKind::Meta(meta) => ButtonKind::Meta(Meta { meta: meta.meta }),
            ButtonKind::Switch(switch) => ButtonKind::Switch(Switch {
                board: Arc::clone(&switch.board),
            }),
        };
        Button {
            title: self.title.clone(),
            on_circle: self.on_circle,
            kind,
        }
    }

    pub fn main_touch_start(&mut self, listener: &mut dyn SoftBoardListener, is_touch_down: bool) {
        match &mut self.kind {
            ButtonKind::Single(single) => single.packet.send(listener),
            ButtonKind::Double(double) => double.start(listener),
            ButtonKind::Alternate(alternate) => {
                alternate.second = false;
                alternate.packets[0].send(listener);
                alternate.sent.record(listener);
            }
            ButtonKind::List(list) => list.start(listener),
            ButtonKind::Multi(multi) => {
                multi.current = 0;
                multi.packets[0].send(listener);
                multi.sent.record(listener);
            }
            ButtonKind::Memory(memory) => memory.start(listener),
            ButtonKind::SpaceTravel(travel) => {
                // Entering by travel only arms the button
                if is_touch_down {
                    travel.packets[0].send(listener);
                    travel.done = TravelDone::Space;
                } else {
                    travel.done = TravelDone::Nothing;
                }
            }
            ButtonKind::Meta(_) | ButtonKind::Switch(_) => {
                self.multi_touch_event(listener, MultiTouchPhase::Press);
                return;
            }
        }
        listener.feedback(Feedback::Primary);
    }

    /// Secondary gesture of `kind`; returns `true` to repeat immediately
    ///
    /// Circle buttons ignore stay gestures and stay buttons ignore circle and
    /// press gestures. Repeating only makes sense for stay.
    pub fn main_touch_secondary(&mut self, listener: &mut dyn SoftBoardListener, kind: i32) -> bool {
        if (kind > 0) != self.on_circle {
            return false;
        }
        match self.fire_secondary(listener) {
            Some(repeat) => {
                listener.feedback(Feedback::Secondary);
                repeat && kind == ON_STAY
            }
            None => false,
        }
    }

    /// Runs the secondary effect; `None` when there was nothing to do
    fn fire_secondary(&mut self, listener: &mut dyn SoftBoardListener) -> Option<bool> {
        match &mut self.kind {
            ButtonKind::Single(single) => {
                if single.packet.is_repeat() {
                    Some(single.packet.send_secondary(listener))
                } else {
                    None
                }
            }
            ButtonKind::Double(double) => {
                let packet = &double.packets[(double.counter % 2) as usize];
                packet.is_repeat().then(|| packet.send_secondary(listener))
            }
            ButtonKind::Alternate(alternate) => {
                if !alternate.sent.undo(listener) {
                    return None;
                }
                alternate.second = !alternate.second;
                alternate.packets[alternate.second as usize].send(listener);
                alternate.sent.record(listener);
                Some(false)
            }
            ButtonKind::List(list) => {
                let alternate = list.roll.alternate.as_ref()?;
                if list.alternate_sent || !list.sent.undo(listener) {
                    return None;
                }
                alternate.send(listener);
                list.alternate_sent = true;
                Some(false)
            }
            ButtonKind::Multi(multi) => {
                if !multi.sent.undo(listener) {
                    return None;
                }
                multi.current = (multi.current + 1) % multi.packets.len();
                multi.packets[multi.current].send(listener);
                multi.sent.record(listener);
                Some(false)
            }
            ButtonKind::Memory(memory) => memory.clear(listener),
            ButtonKind::SpaceTravel(travel) => travel.toggle(listener),
            ButtonKind::Meta(_) | ButtonKind::Switch(_) => None,
        }
    }

    pub fn main_touch_end(&mut self, listener: &mut dyn SoftBoardListener, is_touch_up: bool) {
        match &mut self.kind {
            ButtonKind::Single(single) => single.packet.release(listener),
            ButtonKind::Double(double) => {
                double.packets[(double.counter % 2) as usize].release(listener)
            }
            ButtonKind::Alternate(alternate) => {
                alternate.packets[alternate.second as usize].release(listener)
            }
            ButtonKind::List(list) => match (&list.roll.alternate, list.alternate_sent) {
                (Some(alternate), true) => alternate.release(listener),
                _ => listener.packet_released(),
            },
            ButtonKind::Multi(multi) => multi.packets[multi.current].release(listener),
            ButtonKind::Memory(memory) => {
                if std::mem::take(&mut memory.sent) {
                    listener.packet_released();
                }
            }
            ButtonKind::SpaceTravel(travel) => {
                // Leaving the button while the space is out delivers the alternate
                if !is_touch_up && travel.done == TravelDone::Space {
                    travel.toggle(listener);
                }
                match travel.done {
                    TravelDone::Space => travel.packets[0].release(listener),
                    TravelDone::Secondary => travel.packets[1].release(listener),
                    TravelDone::Nothing | TravelDone::Failed => {}
                }
                travel.done = TravelDone::Nothing;
            }
            ButtonKind::Meta(_) | ButtonKind::Switch(_) => {
                self.multi_touch_event(listener, MultiTouchPhase::Release)
            }
        }
    }

    pub fn multi_touch_event(&mut self, listener: &mut dyn SoftBoardListener, phase: MultiTouchPhase) {
        match &self.kind {
            ButtonKind::Meta(meta) => {
                let state = listener.meta_state_mut();
                match phase {
                    MultiTouchPhase::Press => state.touch(meta.meta),
                    MultiTouchPhase::Release => state.release(meta.meta),
                    MultiTouchPhase::Cancel => state.cancel(meta.meta),
                }
            }
            ButtonKind::Switch(switch) => {
                let table = listener.board_table_mut();
                match phase {
                    MultiTouchPhase::Press => table.press(&switch.board),
                    MultiTouchPhase::Release | MultiTouchPhase::Cancel => {
                        table.release(&switch.board)
                    }
                }
            }
            _ => debug!("Multi-touch event ignored by packet button"),
        }
        if phase == MultiTouchPhase::Press {
            listener.feedback(Feedback::Primary);
        }
    }

    pub fn title(&self, listener: &dyn SoftBoardListener) -> String {
        match &self.kind {
            ButtonKind::Memory(memory) => return memory.title(self.title.as_deref()),
            ButtonKind::Meta(meta) => {
                let name = self
                    .title
                    .as_deref()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{:?}", meta.meta).to_uppercase());
                return match listener.meta_state().level(meta.meta) {
                    MetaLevel::Off => name,
                    MetaLevel::InTouch | MetaLevel::On => format!("{}*", name),
                    MetaLevel::Lock => format!("[{}]", name),
                };
            }
            _ => {}
        }
        if let Some(title) = &self.title {
            return title.to_string();
        }
        match &self.kind {
            ButtonKind::Single(single) => single.packet.title(listener),
            ButtonKind::Double(double) => double.packets[0].title(listener),
            ButtonKind::Alternate(alternate) => alternate.packets[0].title(listener),
            ButtonKind::List(list) => list.roll.modify.first().to_string(),
            ButtonKind::Multi(multi) => multi.packets[0].title(listener),
            ButtonKind::SpaceTravel(travel) => travel.packets[0].title(listener),
            ButtonKind::Switch(switch) => switch.board.to_string(),
            ButtonKind::Memory(_) | ButtonKind::Meta(_) => String::new(),
        }
    }
}

impl Double {
    fn start(&mut self, listener: &mut dyn SoftBoardListener) {
        let now = Instant::now();
        let in_window = self
            .last_touch
            .is_some_and(|last| now.duration_since(last) <= self.window);

        if in_window && self.sent.undo(listener) {
            self.counter += 1;
            debug!("Double tap, parity {}", self.counter % 2);
        } else {
            self.counter = 0;
        }
        self.packets[(self.counter % 2) as usize].send(listener);
        self.sent.record(listener);
        self.last_touch = Some(now);
    }
}

impl List {
    fn start(&mut self, listener: &mut dyn SoftBoardListener) {
        self.alternate_sent = false;
        // The space added after the element stays behind it while cycling
        let suffix = if self.roll.auto_space.contains(AutoSpace::AFTER) {
            " "
        } else {
            ""
        };
        let cycled = self.sent.is_current(listener)
            && self.roll.modify.modify_before(listener, false, suffix);
        if !cycled {
            listener.send_string(self.roll.modify.first(), self.roll.auto_space);
        }
        self.sent.record(listener);
    }
}

impl Memory {
    fn start(&mut self, listener: &mut dyn SoftBoardListener) {
        self.state = match std::mem::replace(&mut self.state, MemoryState::Empty) {
            MemoryState::Empty => {
                listener.start_storing_text();
                debug!("Memory armed");
                MemoryState::Armed
            }
            MemoryState::Armed => {
                let text = listener.stop_storing_text();
                debug!("Memory captured {} chars", text.chars().count());
                if text.is_empty() {
                    MemoryState::Empty
                } else {
                    MemoryState::Holding(text)
                }
            }
            MemoryState::Holding(text) => {
                listener.send_string(&text, AutoSpace::NONE);
                self.sent = true;
                MemoryState::Holding(text)
            }
        };
    }

    fn clear(&mut self, listener: &mut dyn SoftBoardListener) -> Option<bool> {
        match self.state {
            MemoryState::Empty => None,
            MemoryState::Armed => {
                listener.stop_storing_text();
                self.state = MemoryState::Empty;
                Some(false)
            }
            MemoryState::Holding(_) => {
                self.state = MemoryState::Empty;
                Some(false)
            }
        }
    }

    fn title(&self, title: Option<&str>) -> String {
        let name = title.unwrap_or("MEM");
        match &self.state {
            MemoryState::Empty => name.to_string(),
            MemoryState::Armed => format!("[{}]", name),
            MemoryState::Holding(text) => text.chars().take(8).collect(),
        }
    }
}

impl SpaceTravel {
    /// Swaps between the space and the alternate packet
    fn toggle(&mut self, listener: &mut dyn SoftBoardListener) -> Option<bool> {
        let (next, done) = match self.done {
            TravelDone::Space => (1, TravelDone::Secondary),
            TravelDone::Secondary => (0, TravelDone::Space),
            TravelDone::Nothing | TravelDone::Failed => return None,
        };
        if !listener.undo_sent_string() {
            self.done = TravelDone::Failed;
            return None;
        }
        self.packets[next].send(listener);
        self.done = done;
        Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::packet::Function;
    use crate::connection::testing::{Call, RecordingSink};

    fn text(text: &str) -> Packet {
        Packet::text(text, AutoSpace::NONE)
    }

    fn tap(button: &mut Button, sink: &mut RecordingSink) {
        button.main_touch_start(sink, true);
        button.main_touch_end(sink, true);
    }

    #[test]
    fn circle_button_ignores_stay() {
        let mut sink = RecordingSink::default();
        let mut button = Button::alternate(text("a"), text("b")).with_on_circle(true);
        button.main_touch_start(&mut sink, true);
        sink.calls.clear();

        assert!(!button.main_touch_secondary(&mut sink, ON_STAY));
        assert!(sink.calls.is_empty());

        assert!(!button.main_touch_secondary(&mut sink, ON_CIRCLE));
        assert_eq!(sink.text, "b");
        assert!(sink.calls.contains(&Call::Feedback(Feedback::Secondary)));
    }

    #[test]
    fn stay_button_ignores_circle_and_repeats() {
        let mut sink = RecordingSink::with_text("abc");
        let mut button = Button::single(Packet::function(Function::DeleteBefore).with_repeat(true));
        button.main_touch_start(&mut sink, true);

        assert!(!button.main_touch_secondary(&mut sink, ON_CIRCLE));
        assert!(!button.main_touch_secondary(&mut sink, ON_HARD_PRESS));
        assert_eq!(sink.text, "ab");

        assert!(button.main_touch_secondary(&mut sink, ON_STAY));
        assert!(button.main_touch_secondary(&mut sink, ON_STAY));
        assert_eq!(sink.text, "");
    }

    #[test]
    fn repeat_is_only_reported_for_stay() {
        let mut sink = RecordingSink::with_text("abc");
        let mut button = Button::single(Packet::function(Function::DeleteBefore).with_repeat(true))
            .with_on_circle(true);
        assert!(!button.main_touch_secondary(&mut sink, ON_CIRCLE));
        assert_eq!(sink.text, "ab");
    }

    #[test]
    fn double_tap_replaces_first_packet() {
        let mut sink = RecordingSink::default();
        let mut button = Button::double(text("."), text("!"), Duration::from_secs(60));

        tap(&mut button, &mut sink);
        assert_eq!(sink.text, ".");
        tap(&mut button, &mut sink);
        assert_eq!(sink.text, "!");
        tap(&mut button, &mut sink);
        assert_eq!(sink.text, ".");
    }

    #[test]
    fn double_tap_needs_untouched_editor() {
        let mut sink = RecordingSink::default();
        let mut button = Button::double(text("."), text("!"), Duration::from_secs(60));
        let mut other = Button::single(text("x"));

        tap(&mut button, &mut sink);
        tap(&mut other, &mut sink);
        tap(&mut button, &mut sink);
        assert_eq!(sink.text, ".x.");
    }

    #[test]
    fn double_buttons_keep_their_own_counters() {
        let mut sink = RecordingSink::default();
        let template = Button::double(text("a"), text("A"), Duration::from_secs(60));
        let mut first = template.instantiate();
        let mut second = template.instantiate();

        tap(&mut first, &mut sink);
        tap(&mut first, &mut sink);
        assert_eq!(sink.text, "A");

        // The other instance starts its own run instead of continuing parity
        tap(&mut second, &mut sink);
        assert_eq!(sink.text, "Aa");
        tap(&mut second, &mut sink);
        assert_eq!(sink.text, "AA");
    }

    #[test]
    fn list_cycles_through_roll() {
        let mut sink = RecordingSink::default();
        let mut button = Button::list(
            vec!["a".into(), "á".into(), "à".into()],
            AutoSpace::NONE,
            Some(text("@")),
        )
        .unwrap();

        tap(&mut button, &mut sink);
        tap(&mut button, &mut sink);
        tap(&mut button, &mut sink);
        assert_eq!(sink.text, "à");
        tap(&mut button, &mut sink);
        assert_eq!(sink.text, "a");
    }

    #[test]
    fn list_secondary_swaps_in_alternate() {
        let mut sink = RecordingSink::with_text("x");
        let mut button =
            Button::list(vec!["a".into(), "á".into()], AutoSpace::NONE, Some(text("@"))).unwrap();

        button.main_touch_start(&mut sink, true);
        assert_eq!(sink.text, "xa");
        assert!(!button.main_touch_secondary(&mut sink, ON_STAY));
        assert!(!button.main_touch_secondary(&mut sink, ON_STAY));
        button.main_touch_end(&mut sink, true);
        assert_eq!(sink.text, "x@");
        assert_eq!(sink.calls.last(), Some(&Call::PacketReleased));
    }

    #[test]
    fn list_needs_roll() {
        assert!(Button::list(Vec::new(), AutoSpace::NONE, None).is_err());
    }

    #[test]
    fn multi_advances_with_wraparound() {
        let mut sink = RecordingSink::default();
        let mut button = Button::multi(vec![text("1"), text("2"), text("3")]).unwrap();

        button.main_touch_start(&mut sink, true);
        for expected in ["2", "3", "1"] {
            assert!(!button.main_touch_secondary(&mut sink, ON_STAY));
            assert_eq!(sink.text, expected);
        }
        button.main_touch_end(&mut sink, true);
        assert!(Button::multi(Vec::new()).is_err());
    }

    #[test]
    fn memory_captures_and_replays() {
        let mut sink = RecordingSink::default();
        let mut memory = Button::memory();
        let mut letter = Button::single(text("hi"));

        tap(&mut memory, &mut sink);
        assert_eq!(memory.title(&sink), "[MEM]");
        tap(&mut letter, &mut sink);
        tap(&mut memory, &mut sink);
        assert_eq!(memory.title(&sink), "hi");

        tap(&mut memory, &mut sink);
        assert_eq!(sink.text, "hihi");

        button_clear(&mut memory, &mut sink);
        assert_eq!(memory.title(&sink), "MEM");
    }

    fn button_clear(button: &mut Button, sink: &mut RecordingSink) {
        button.main_touch_start(sink, true);
        button.main_touch_secondary(sink, ON_STAY);
        button.main_touch_end(sink, true);
    }

    #[test]
    fn space_travel_toggles_between_space_and_alternate() {
        let mut sink = RecordingSink::default();
        let mut button = Button::space_travel(text(" "), text("\n"));

        button.main_touch_start(&mut sink, true);
        assert_eq!(sink.text, " ");
        button.main_touch_secondary(&mut sink, ON_STAY);
        assert_eq!(sink.text, "\n");
        button.main_touch_secondary(&mut sink, ON_STAY);
        assert_eq!(sink.text, " ");
        button.main_touch_end(&mut sink, true);
        assert_eq!(sink.text, " ");

        button.main_touch_start(&mut sink, true);
        button.main_touch_end(&mut sink, false);
        assert_eq!(sink.text, " \n");
    }

    #[test]
    fn meta_button_drives_meta_state() {
        let mut sink = RecordingSink::default();
        let mut shift = Button::meta(0).unwrap();
        let mut letter = Button::single(text("a"));

        tap(&mut shift, &mut sink);
        assert_eq!(shift.title(&sink), "SHIFT*");
        tap(&mut letter, &mut sink);
        tap(&mut letter, &mut sink);
        assert_eq!(sink.text, "Aa");

        shift.multi_touch_event(&mut sink, MultiTouchPhase::Press);
        letter.main_touch_start(&mut sink, true);
        letter.main_touch_end(&mut sink, true);
        shift.multi_touch_event(&mut sink, MultiTouchPhase::Release);
        assert_eq!(sink.text, "AaA");
        assert_eq!(sink.meta.level(MetaType::Shift), MetaLevel::Off);
    }

    #[test]
    fn invalid_meta_type_fails_at_construction() {
        assert!(matches!(
            Button::meta(7),
            Err(BoardError::InvalidExternalData(_))
        ));
    }

    #[test]
    fn switch_button_drives_board_table() {
        let mut sink = RecordingSink {
            boards: crate::board::BoardTable::new(vec!["main".into(), "numbers".into()]).unwrap(),
            ..Default::default()
        };
        let mut switch = Button::switch("numbers");
        tap(&mut switch, &mut sink);
        assert_eq!(sink.boards.active(), "numbers");
        assert_eq!(switch.title(&sink), "numbers");
    }
}
