use std::io::{Read, Write};

use excavation_persistence::{CodecError, GameDataReader, GameDataWriter, Persistable};

/// Container that accumulates the gold bars the player deposits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sack {
    gold_bars: i32,
}

impl Sack {
    /// Creates an empty sack.
    #[must_use]
    pub const fn new() -> Self {
        Self { gold_bars: 0 }
    }

    /// Gold bars currently held.
    #[must_use]
    pub const fn gold_bars(&self) -> i32 {
        self.gold_bars
    }

    /// Adds gold bars and returns the new total.
    ///
    /// The total never drops below zero; a removal larger than the content
    /// empties the sack.
    pub fn add(&mut self, count: i32) -> i32 {
        self.gold_bars = self.gold_bars.saturating_add(count).max(0);
        self.gold_bars
    }

    /// Empties the sack.
    pub fn clear(&mut self) {
        self.gold_bars = 0;
    }
}

impl Persistable for Sack {
    fn save<W: Write>(&self, writer: &mut GameDataWriter<W>) -> Result<(), CodecError> {
        writer.write_i32(self.gold_bars)
    }

    fn load<R: Read>(&mut self, reader: &mut GameDataReader<R>) -> Result<(), CodecError> {
        self.gold_bars = reader.read_i32()?;
        Ok(())
    }
}
