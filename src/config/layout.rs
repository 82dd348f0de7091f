//! TOML layout files and their conversion into keyboard parts
//!
//! ```toml
//! [settings]
//! boards = ["main", "numbers"]
//!
//! [[varia]]
//! id = "accents"
//! keep_code = true
//! [[varia.group]]
//! code = "'"
//! legends = ["á", { text = "é", title = "e'" }]
//!
//! [[shortcut]]
//! id = "en"
//! entries = { btw = "by the way" }
//!
//! [[button]]
//! type = "single"
//! packet = { type = "text", text = "a" }
//! ```

use super::{BoardSettings, ConfigError};
use crate::board::{BoardError, BoardTable, Button, Function, MetaType, Packet, PacketKind};
use crate::codetext::{
    CodeTextProcessor, Collecting, Entry, EntryList, ModifyText, Ready, Varia, VariaGroup,
    VariaLegend,
};
use crate::connection::{AutoSpace, Connection, KeyCode, Movement, SoftBoardService};
use crate::engine::TouchEvent;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Layout used when no layout file exists
pub const DEFAULT_LAYOUT: &str = include_str!("default_layout.toml");

const LAYOUT_DIR: &str = "softboard";
const LAYOUT_FILE: &str = "layout.toml";

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Layout {
    #[serde(default)]
    pub settings: BoardSettings,
    #[serde(default)]
    pub varia: Vec<VariaSpec>,
    #[serde(default)]
    pub shortcut: Vec<ShortCutSpec>,
    #[serde(default)]
    pub shortcut_set: Vec<ShortCutSetSpec>,
    #[serde(default)]
    pub modify: ModifySpec,
    #[serde(default)]
    pub button: Vec<ButtonSpec>,
    /// Touch events replayed by the demo binary
    #[serde(default)]
    pub script: Vec<TouchEvent>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct VariaSpec {
    pub id: String,
    #[serde(default)]
    pub keep_code: bool,
    #[serde(default)]
    pub group: Vec<VariaGroupSpec>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct VariaGroupSpec {
    pub code: String,
    pub legends: Vec<LegendSpec>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum LegendSpec {
    Text(String),
    Titled { text: String, title: String },
}

#[derive(Deserialize, Clone, Debug)]
pub struct ShortCutSpec {
    pub id: String,
    /// Code to expansion
    pub entries: BTreeMap<String, String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ShortCutSetSpec {
    pub id: String,
    pub members: Vec<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ModifySpec {
    #[serde(default)]
    pub rolls: Vec<Vec<String>>,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AutoSpaceFlag {
    Before,
    After,
    EraseBefore,
}

fn auto_space(flags: &[AutoSpaceFlag]) -> AutoSpace {
    flags.iter().fold(AutoSpace::NONE, |space, flag| {
        space
            | match flag {
                AutoSpaceFlag::Before => AutoSpace::BEFORE,
                AutoSpaceFlag::After => AutoSpace::AFTER,
                AutoSpaceFlag::EraseBefore => AutoSpace::ERASE_BEFORE,
            }
    })
}

#[derive(Deserialize, Clone, Debug)]
pub struct PacketSpec {
    pub title: Option<String>,
    #[serde(default)]
    pub repeat: bool,
    #[serde(flatten)]
    pub kind: PacketKindSpec,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PacketKindSpec {
    Text {
        text: String,
        #[serde(default)]
        auto_space: Vec<AutoSpaceFlag>,
    },
    Key {
        code: KeyCode,
    },
    Function {
        name: String,
    },
    Run {
        package: String,
    },
    Combine {
        packets: Vec<PacketSpec>,
    },
    Move {
        movement: Movement,
        #[serde(default)]
        select: bool,
    },
    TextTime {
        format: String,
    },
    Varia {
        varia: String,
        index: usize,
    },
}

/// Meta type by name or by its raw number
#[derive(Deserialize, Clone, Copy, Debug)]
#[serde(untagged)]
pub enum MetaSpec {
    Number(i32),
    Name(MetaType),
}

#[derive(Deserialize, Clone, Debug)]
pub struct ButtonSpec {
    pub title: Option<String>,
    #[serde(default)]
    pub on_circle: bool,
    #[serde(flatten)]
    pub kind: ButtonKindSpec,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ButtonKindSpec {
    Single {
        packet: PacketSpec,
    },
    Double {
        first: PacketSpec,
        second: PacketSpec,
    },
    Alternate {
        first: PacketSpec,
        second: PacketSpec,
    },
    List {
        roll: Vec<String>,
        #[serde(default)]
        auto_space: Vec<AutoSpaceFlag>,
        alternate: Option<PacketSpec>,
    },
    Multi {
        packets: Vec<PacketSpec>,
    },
    Memory,
    SpaceTravel {
        space: PacketSpec,
        alternate: PacketSpec,
    },
    Meta {
        meta: MetaSpec,
    },
    Switch {
        board: String,
    },
}

/// Keyboard parts built from a layout
pub struct BuiltLayout {
    pub code_text: CodeTextProcessor<Ready>,
    /// Button templates, see [`BuiltLayout::instantiate_buttons`]
    pub buttons: Vec<Button>,
    pub modify: Option<ModifyText>,
    pub boards: BoardTable,
    pub settings: BoardSettings,
}

impl BuiltLayout {
    /// Fresh button instances sharing the templates' packets
    pub fn instantiate_buttons(&self) -> Vec<Button> {
        self.buttons.iter().map(Button::instantiate).collect()
    }

    /// Service over `connection` plus the button instances driving it
    pub fn into_service(self, connection: Box<dyn Connection>) -> (SoftBoardService, Vec<Button>) {
        let buttons = self.instantiate_buttons();
        let service = SoftBoardService::new(connection, self.code_text, self.settings.text_limit)
            .with_modify(self.modify)
            .with_boards(self.boards);
        (service, buttons)
    }
}

impl FromStr for Layout {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(content)?)
    }
}

impl Layout {
    /// Default location below the user's config directory
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(LAYOUT_DIR);
        path.push(LAYOUT_FILE);
        path
    }

    /// Loads `path`, or the default location falling back to the built-in layout
    ///
    /// An explicitly given path must exist.
    pub async fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(&path).await,
            None => {
                let path = Self::default_path();
                let exists = tokio::fs::try_exists(&path)
                    .await
                    .map_err(|source| ConfigError::Read {
                        path: path.clone(),
                        source,
                    })?;
                if exists {
                    Self::read(&path).await
                } else {
                    warn!(
                        "No layout at {}, using the built-in layout",
                        path.display()
                    );
                    DEFAULT_LAYOUT.parse()
                }
            }
        }
    }

    async fn read(path: &Path) -> Result<Self, ConfigError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        let layout: Self = content.parse()?;
        info!(
            "Loaded layout {} with {} buttons",
            path.display(),
            layout.button.len()
        );
        Ok(layout)
    }

    /// Validates the layout and builds its parts
    pub fn build(&self) -> Result<BuiltLayout, ConfigError> {
        let settings = self.settings.clone();
        let boards = BoardTable::new(settings.boards.clone())?;
        let code_text = self.collect_code_text()?;

        let mut builder = ButtonBuilder {
            code_text: &code_text,
            boards: &boards,
            settings: &settings,
            abbreviation_keys: HashSet::new(),
        };
        let buttons = self
            .button
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                builder.button(spec).map_err(|e| {
                    warn!("Layout button {} rejected: {}", index, e);
                    e
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let abbreviation_keys = builder.abbreviation_keys;

        let modify = if self.modify.rolls.is_empty() {
            None
        } else {
            Some(ModifyText::new(self.modify.rolls.clone())?)
        };

        debug!("Abbreviation keys: {:?}", abbreviation_keys);
        let code_text = code_text.init(&abbreviation_keys);
        info!("Layout built: {} buttons", buttons.len());

        Ok(BuiltLayout {
            code_text,
            buttons,
            modify,
            boards,
            settings,
        })
    }

    fn collect_code_text(&self) -> Result<CodeTextProcessor<Collecting>, ConfigError> {
        let mut code_text = CodeTextProcessor::create();

        for spec in &self.varia {
            let mut varia = Varia::new(spec.keep_code);
            for group in &spec.group {
                let legends = group
                    .legends
                    .iter()
                    .map(|legend| match legend {
                        LegendSpec::Text(text) => VariaLegend::new(text.as_str()),
                        LegendSpec::Titled { text, title } => {
                            VariaLegend::new(text.as_str()).with_title(title.as_str())
                        }
                    })
                    .collect();
                varia.add_group(VariaGroup::new(group.code.as_str(), legends))?;
            }
            code_text.add_varia(spec.id.as_str(), varia)?;
        }

        for spec in &self.shortcut {
            let mut list = EntryList::with_capacity(spec.entries.len());
            for (code, expanded) in &spec.entries {
                if code.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "shortcut list {:?} has an empty code",
                        spec.id
                    )));
                }
                list.add(Entry::short_cut(code.as_str(), expanded.as_str()));
            }
            code_text.add_short_cut_list(spec.id.as_str(), list)?;
        }

        for spec in &self.shortcut_set {
            let members: Vec<&str> = spec.members.iter().map(String::as_str).collect();
            code_text.add_short_cut_set(spec.id.as_str(), &members)?;
        }

        Ok(code_text)
    }
}

/// Converts button specs, checking their references on the way
struct ButtonBuilder<'a> {
    code_text: &'a CodeTextProcessor<Collecting>,
    boards: &'a BoardTable,
    settings: &'a BoardSettings,
    abbreviation_keys: HashSet<String>,
}

impl ButtonBuilder<'_> {
    fn button(&mut self, spec: &ButtonSpec) -> Result<Button, ConfigError> {
        let button = match &spec.kind {
            ButtonKindSpec::Single { packet } => Button::single(self.packet(packet)?),
            ButtonKindSpec::Double { first, second } => Button::double(
                self.packet(first)?,
                self.packet(second)?,
                self.settings.double_tap_window(),
            ),
            ButtonKindSpec::Alternate { first, second } => {
                Button::alternate(self.packet(first)?, self.packet(second)?)
            }
            ButtonKindSpec::List {
                roll,
                auto_space: flags,
                alternate,
            } => {
                let alternate = alternate
                    .as_ref()
                    .map(|packet| self.packet(packet))
                    .transpose()?;
                Button::list(roll.clone(), auto_space(flags), alternate)?
            }
            ButtonKindSpec::Multi { packets } => Button::multi(
                packets
                    .iter()
                    .map(|packet| self.packet(packet))
                    .collect::<Result<_, _>>()?,
            )?,
            ButtonKindSpec::Memory => Button::memory(),
            ButtonKindSpec::SpaceTravel { space, alternate } => {
                Button::space_travel(self.packet(space)?, self.packet(alternate)?)
            }
            ButtonKindSpec::Meta { meta } => match meta {
                MetaSpec::Number(number) => Button::meta(*number)?,
                MetaSpec::Name(meta) => Button::meta_of(*meta),
            },
            ButtonKindSpec::Switch { board } => {
                if !self.boards.contains(board) {
                    return Err(BoardError::UnknownReference(format!(
                        "switch to unknown board {:?}",
                        board
                    ))
                    .into());
                }
                Button::switch(board.as_str())
            }
        };

        let button = button.with_on_circle(spec.on_circle);
        Ok(match &spec.title {
            Some(title) => button.with_title(title.as_str()),
            None => button,
        })
    }

    fn packet(&mut self, spec: &PacketSpec) -> Result<Packet, ConfigError> {
        let packet = match &spec.kind {
            PacketKindSpec::Text {
                text,
                auto_space: flags,
            } => Packet::text(text.as_str(), auto_space(flags)),
            PacketKindSpec::Key { code } => Packet::key(*code),
            PacketKindSpec::Function { name } => {
                let function: Function = name.parse()?;
                if let Function::ToggleAbbreviation(id) = &function {
                    if self.code_text.short_cut(id).is_none() {
                        return Err(BoardError::UnknownReference(format!(
                            "abbreviation key for unknown shortcut {:?}",
                            id
                        ))
                        .into());
                    }
                }
                Packet::function(function)
            }
            PacketKindSpec::Run { package } => Packet::run(package.as_str()),
            PacketKindSpec::Combine { packets } => Packet::combine(
                packets
                    .iter()
                    .map(|packet| self.packet(packet))
                    .collect::<Result<_, _>>()?,
            )?,
            PacketKindSpec::Move { movement, select } => Packet::movement(*movement, *select),
            PacketKindSpec::TextTime { format } => Packet::text_time(format.as_str())?,
            PacketKindSpec::Varia { varia, index } => {
                let Some(known) = self.code_text.varia(varia) else {
                    return Err(BoardError::UnknownReference(format!(
                        "packet uses unknown varia {:?}",
                        varia
                    ))
                    .into());
                };
                if known.groups().iter().all(|group| *index >= group.len()) {
                    warn!(
                        "Legend {} of varia {:?} is missing in every group",
                        index, varia
                    );
                }
                Packet::varia(varia.as_str(), *index)
            }
        };

        if !matches!(packet.kind(), PacketKind::Combine(_)) {
            self.abbreviation_keys
                .extend(packet.abbreviation_keys().into_iter().map(str::to_string));
        }

        let packet = packet.with_repeat(spec.repeat);
        Ok(match &spec.title {
            Some(title) => packet.with_title(title.as_str()),
            None => packet,
        })
    }
}
