//! `map_connections.txt`: one connection per line, no sections.
//!
//! ```text
//! map1,edge1,offset1,map2,edge2,offset2
//! ```

use std::io::BufRead;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{PbsError, Result};
use crate::parser::csv::{parse_i32, parse_uint, split_csv_line};
use crate::parser::{open_file, FileLineData, Lines};
use crate::registry::GameData;
use crate::schema::Element;
use crate::settings::SettingsHandle;
use crate::types::{Direction, MapConnection};

use super::writer::PbsText;
use super::{CompileContext, PbsCompiler};

const FILE_BASE: &str = "map_connections";

pub struct MapConnectionCompiler {
    settings: SettingsHandle,
}

impl MapConnectionCompiler {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn path(&self) -> PathBuf {
        self.settings.read().pbs_file(FILE_BASE)
    }

    pub fn compile_from<R: BufRead>(
        &self,
        reader: R,
        base: FileLineData,
        data: &mut GameData,
        ctx: &mut CompileContext,
    ) -> Result<()> {
        let mut connections = Vec::new();
        for (index, line) in Lines::new(reader, ctx.cancel.clone()).enumerate() {
            let line = line?;
            let line_data = base.with_line(&line.text, line.number);
            let index = u32::try_from(index)
                .map_err(|_| PbsError::parse_at("Too many map connections.", &line_data))?;
            let connection = parse_connection(&line.text, index)
                .map_err(|e| PbsError::parse_at(e, &line_data))?;
            connections.push(connection);
        }
        debug!(count = connections.len(), "Importing map connections");
        data.map_connections.import(connections);
        Ok(())
    }

    pub fn render(&self, data: &GameData) -> PbsText {
        let mut text = PbsText::new();
        text.separator();
        for conn in data.map_connections.iter() {
            if let (Some(name1), Some(name2)) = (data.map_name(conn.map1), data.map_name(conn.map2)) {
                text.line(format!("# {} ({}) - {} ({})", name1, conn.map1, name2, conn.map2));
            }
            text.line(format!(
                "{},{},{},{},{},{}",
                conn.map1,
                conn.edge1.letter(),
                conn.offset1,
                conn.map2,
                conn.edge2.letter(),
                conn.offset2
            ));
        }
        text
    }
}

fn direction(raw: &str) -> std::result::Result<Direction, String> {
    Direction::parse(raw).ok_or_else(|| format!("Invalid direction: {}", raw.trim()))
}

fn parse_connection(text: &str, index: u32) -> std::result::Result<MapConnection, String> {
    let fields = split_csv_line(text);
    if fields.len() != 6 {
        return Err("Invalid number of elements in map connection, expected 6.".to_string());
    }
    let connection = MapConnection {
        index,
        map1: parse_uint(&fields[0], &Element::uint())?,
        edge1: direction(&fields[1])?,
        offset1: parse_i32(&fields[2], &Element::int())?,
        map2: parse_uint(&fields[3], &Element::uint())?,
        edge2: direction(&fields[4])?,
        offset2: parse_i32(&fields[5], &Element::int())?,
    };
    if connection.edge2 != connection.edge1.opposite() {
        return Err(format!(
            "{} side of first map must connect with {} side of second map.",
            connection.edge1.label(),
            connection.edge1.opposite().label().to_lowercase()
        ));
    }
    Ok(connection)
}

impl PbsCompiler for MapConnectionCompiler {
    fn order(&self) -> i32 {
        2
    }

    fn file_names(&self) -> Vec<PathBuf> {
        vec![self.path()]
    }

    fn compile(&self, data: &mut GameData, ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        info!("Compiling PBS file \"{}\"", path.display());
        let reader = open_file(&path)?;
        self.compile_from(reader, FileLineData::new(&path), data, ctx)
    }

    fn write_to_file(&self, data: &GameData, _ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        info!("Writing PBS file \"{}\"", path.display());
        self.render(data).write_to(&path)
    }
}
