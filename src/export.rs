//! CSV export of ranked tables.

use std::path::Path;

use csv::WriterBuilder;

use crate::{
    error::ExportError,
    types::{ArtistRow, ExportTable, TableKind, TrackRow},
};

/// Encodes a table as CSV with a header row.
///
/// Column order is fixed per kind: `Rank,Artist,ID` for artists and
/// `Rank,Track,Artist,ID` for tracks.
pub fn encode_table(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    // header is written explicitly so empty tables still get one
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(Vec::new());

    match table.kind {
        TableKind::Artists => {
            wtr.write_record(["Rank", "Artist", "ID"])?;
            for item in &table.items {
                wtr.serialize(ArtistRow {
                    rank: item.rank,
                    artist: &item.name,
                    id: &item.id,
                })?;
            }
        }
        TableKind::Tracks => {
            wtr.write_record(["Rank", "Track", "Artist", "ID"])?;
            for item in &table.items {
                wtr.serialize(TrackRow {
                    rank: item.rank,
                    track: &item.name,
                    artist: item.primary_artist.as_deref().unwrap_or_default(),
                    id: &item.id,
                })?;
            }
        }
    }

    wtr.into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

/// Writes `table` to `path`, creating missing parent directories.
///
/// Returns the number of data rows written. Callers are expected to skip empty
/// tables, this function writes whatever it is given.
pub async fn export_table(table: &ExportTable, path: &Path) -> Result<usize, ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let bytes = encode_table(table)?;
    async_fs::write(path, bytes).await.map_err(io_err)?;

    Ok(table.len())
}
