//! Map descriptions and the text map loader
//!
//! A [`MapDescription`] is the already-parsed form of a city map: width,
//! height and, per cell, an optional road direction, optional traffic light,
//! obstacle flag and destination flag. The core simulation only consumes this
//! structure; [`MapDescription::parse`] is the reference loader for the text
//! format (one character per cell plus a JSON symbol dictionary).

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::error::MapError;
use super::traffic_light::LightState;
use super::types::{Coord, Direction};

/// Fixed symbol for an obstacle cell
pub const OBSTACLE_SYMBOL: char = '#';
/// Fixed symbol for a destination cell
pub const DESTINATION_SYMBOL: char = 'D';
/// Fixed symbol for empty ground
pub const EMPTY_SYMBOL: char = '.';

/// A traffic light as declared by the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightSpec {
    /// Ticks between toggles
    pub period: u32,
    pub initial: LightState,
}

/// Everything the map declares about one cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSpec {
    pub road: Option<Direction>,
    pub light: Option<LightSpec>,
    pub obstacle: bool,
    pub destination: bool,
}

impl CellSpec {
    pub fn is_empty(&self) -> bool {
        self.road.is_none() && self.light.is_none() && !self.obstacle && !self.destination
    }
}

/// What a dictionary symbol stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolMeta {
    Road(Direction),
    Light { period: u32 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMeta {
    Number(u64),
    Text(String),
}

/// Symbol to metadata mapping for the text map format
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolDictionary {
    symbols: BTreeMap<char, SymbolMeta>,
}

impl SymbolDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object such as `{">": "Right", "S": 15, "s": "7"}`
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let raw: BTreeMap<String, RawMeta> = serde_json::from_str(json)?;
        let mut dictionary = Self::new();

        for (key, value) in raw {
            let mut chars = key.chars();
            let symbol = match (chars.next(), chars.next()) {
                (Some(symbol), None) => symbol,
                _ => {
                    return Err(MapError::InvalidMetadata {
                        symbol: key,
                        value: "symbol must be a single character".to_string(),
                    })
                }
            };

            let meta = match value {
                RawMeta::Number(period) => SymbolMeta::Light {
                    period: u32::try_from(period).map_err(|_| MapError::InvalidMetadata {
                        symbol: key.clone(),
                        value: period.to_string(),
                    })?,
                },
                RawMeta::Text(text) => {
                    if let Some(direction) = Direction::from_name(text.trim()) {
                        SymbolMeta::Road(direction)
                    } else if let Ok(period) = text.trim().parse::<u32>() {
                        SymbolMeta::Light { period }
                    } else {
                        return Err(MapError::InvalidMetadata {
                            symbol: key,
                            value: text,
                        });
                    }
                }
            };

            dictionary.insert(symbol, meta);
        }

        Ok(dictionary)
    }

    pub fn insert(&mut self, symbol: char, meta: SymbolMeta) {
        self.symbols.insert(symbol, meta);
    }

    pub fn get(&self, symbol: char) -> Option<SymbolMeta> {
        self.symbols.get(&symbol).copied()
    }
}

/// Parsed city map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDescription {
    width: usize,
    height: usize,
    /// Row-major, row 0 is `y = 0` (the bottom row)
    cells: Vec<CellSpec>,
}

impl MapDescription {
    /// An all-empty map of the given size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellSpec::default(); width * height],
        }
    }

    /// Build from an explicit cell list, validating the result
    pub fn from_cells(width: usize, height: usize, cells: Vec<CellSpec>) -> Result<Self, MapError> {
        let map = Self {
            width,
            height,
            cells,
        };
        map.validate()?;
        Ok(map)
    }

    /// Parse the text map format
    ///
    /// The first non-blank line is the top row of the map. Dictionary directions become
    /// roads and dictionary periods become traffic lights; an uppercase light
    /// symbol starts red, a lowercase one starts green.
    pub fn parse(text: &str, dictionary: &SymbolDictionary) -> Result<Self, MapError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        // Blank lines around the map are ignored, blank lines inside it are not
        let first = lines.iter().position(|line| !line.is_empty());
        let last = lines.iter().rposition(|line| !line.is_empty());
        let rows: Vec<&str> = match (first, last) {
            (Some(first), Some(last)) => lines[first..=last].to_vec(),
            _ => return Err(MapError::EmptyMap),
        };

        let height = rows.len();
        let width = rows[0].chars().count();
        if width == 0 {
            return Err(MapError::EmptyMap);
        }

        let mut map = Self::new(width, height);

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(MapError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }

            let y = (height - row - 1) as i32;
            for (col, symbol) in line.chars().enumerate() {
                let coord = Coord::new(col as i32, y);
                let cell = map.cell_mut(coord)?;
                match symbol {
                    OBSTACLE_SYMBOL => cell.obstacle = true,
                    DESTINATION_SYMBOL => cell.destination = true,
                    EMPTY_SYMBOL => {}
                    _ => match dictionary.get(symbol) {
                        Some(SymbolMeta::Road(direction)) => cell.road = Some(direction),
                        Some(SymbolMeta::Light { period }) => {
                            let initial = if symbol.is_uppercase() {
                                LightState::Red
                            } else {
                                LightState::Green
                            };
                            cell.light = Some(LightSpec { period, initial });
                        }
                        None => return Err(MapError::UnknownSymbol { symbol, row, col }),
                    },
                }
            }
        }

        map.validate()?;
        Ok(map)
    }

    /// Read a text map and its JSON dictionary from disk
    pub fn load(map_path: impl AsRef<Path>, dictionary_path: impl AsRef<Path>) -> Result<Self, MapError> {
        let dictionary = SymbolDictionary::from_json(&std::fs::read_to_string(dictionary_path)?)?;
        let text = std::fs::read_to_string(map_path)?;
        Self::parse(&text, &dictionary)
    }

    /// Check the cell invariants; every constructor that accepts outside
    /// data ends with this.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.width == 0 || self.height == 0 {
            return Err(MapError::EmptyMap);
        }
        let expected = self.width * self.height;
        if self.cells.len() != expected {
            return Err(MapError::DimensionMismatch {
                expected,
                found: self.cells.len(),
            });
        }

        for (coord, cell) in self.cells() {
            if cell.obstacle && (cell.road.is_some() || cell.light.is_some()) {
                return Err(MapError::ObstacleOnRoad(coord));
            }
            if matches!(cell.light, Some(LightSpec { period: 0, .. })) {
                return Err(MapError::ZeroPeriod(coord));
            }
        }

        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    fn index_of(&self, coord: Coord) -> Option<usize> {
        self.in_bounds(coord)
            .then(|| coord.y as usize * self.width + coord.x as usize)
    }

    pub fn cell(&self, coord: Coord) -> Option<&CellSpec> {
        self.index_of(coord).map(|index| &self.cells[index])
    }

    fn cell_mut(&mut self, coord: Coord) -> Result<&mut CellSpec, MapError> {
        let index = self.index_of(coord).ok_or(MapError::OutOfBounds(coord))?;
        Ok(&mut self.cells[index])
    }

    /// All cells in row-major order, bottom row first
    pub fn cells(&self) -> impl Iterator<Item = (Coord, &CellSpec)> + '_ {
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let coord = Coord::new((index % self.width) as i32, (index / self.width) as i32);
            (coord, cell)
        })
    }

    pub fn set_road(&mut self, coord: Coord, direction: Direction) -> Result<(), MapError> {
        self.cell_mut(coord)?.road = Some(direction);
        Ok(())
    }

    /// Place a light that starts red
    pub fn set_light(&mut self, coord: Coord, period: u32) -> Result<(), MapError> {
        self.set_light_with_state(coord, period, LightState::Red)
    }

    pub fn set_light_with_state(
        &mut self,
        coord: Coord,
        period: u32,
        initial: LightState,
    ) -> Result<(), MapError> {
        self.cell_mut(coord)?.light = Some(LightSpec { period, initial });
        Ok(())
    }

    pub fn set_obstacle(&mut self, coord: Coord) -> Result<(), MapError> {
        self.cell_mut(coord)?.obstacle = true;
        Ok(())
    }

    pub fn set_destination(&mut self, coord: Coord) -> Result<(), MapError> {
        self.cell_mut(coord)?.destination = true;
        Ok(())
    }
}
