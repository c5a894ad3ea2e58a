use std::io::{Read, Write};

use excavation_persistence::{CodecError, GameDataReader, GameDataWriter, Persistable};
use glam::Vec3;

/// Persistent record of the player avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Player {
    /// World-space position of the avatar.
    pub position: Vec3,
    /// Tools left to dig with.
    pub tools: i32,
}

impl Persistable for Player {
    fn save<W: Write>(&self, writer: &mut GameDataWriter<W>) -> Result<(), CodecError> {
        writer.write_vec3(self.position)?;
        writer.write_i32(self.tools)
    }

    fn load<R: Read>(&mut self, reader: &mut GameDataReader<R>) -> Result<(), CodecError> {
        self.position = reader.read_vec3()?;
        self.tools = reader.read_i32()?;
        Ok(())
    }
}
