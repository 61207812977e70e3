//! Persistent storage for device settings.
//!
//! Uses the nRF52840's internal flash via `sequential-storage` crate
//! to keep the settings record across power cycles.
//!
//! Storage layout:
//!   - One map item holds the whole serialized [`MemoryStore`].
//!   - Items are appended sequentially; the flash pages are managed
//!     by `sequential-storage` which handles wear levelling and GC.

use defmt::{debug, error, info, warn};
use embedded_storage_async::nor_flash::NorFlash;
use kronos::config::{SETTINGS_BLOB_SIZE, STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use kronos::settings::MemoryStore;
use sequential_storage::cache::NoCache;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key for the settings record in the map storage.
const KEY_SETTINGS: u8 = 0x01;

/// Map item overhead on top of the blob (key byte plus item header).
const ITEM_OVERHEAD: usize = 32;

/// Load the settings record. Missing or unreadable records give an
/// empty store, which `DeviceSettings::load` then fills with defaults.
pub async fn load_from_flash(flash: &mut impl NorFlash) -> MemoryStore {
    let mut buf = [0u8; SETTINGS_BLOB_SIZE + ITEM_OVERHEAD];

    let fetched = sequential_storage::map::fetch_item::<u8, &[u8], _>(
        flash,
        STORAGE_START..STORAGE_END,
        &mut NoCache::new(),
        &mut buf,
        &KEY_SETTINGS,
    )
    .await;

    match fetched {
        Ok(Some(data)) => match MemoryStore::deserialize(data) {
            Ok(store) => {
                info!("Loaded {} settings from flash", store.len());
                store
            }
            Err(e) => {
                warn!("Settings record corrupt ({}), starting empty", e);
                MemoryStore::new()
            }
        },
        Ok(None) => {
            info!("No settings in flash");
            MemoryStore::new()
        }
        Err(e) => {
            error!("Flash read error: {:?}", defmt::Debug2Format(&e));
            MemoryStore::new()
        }
    }
}

/// Persist the store if it changed since the last load or save.
pub async fn save_to_flash(store: &mut MemoryStore, flash: &mut impl NorFlash) {
    if !store.is_dirty() {
        debug!("Settings: no changes to save");
        return;
    }

    let mut data_buf = [0u8; SETTINGS_BLOB_SIZE];
    let len = match store.serialize(&mut data_buf) {
        Ok(len) => len,
        Err(e) => {
            error!("Settings do not fit the flash record: {}", e);
            return;
        }
    };
    let item = &data_buf[..len];

    let mut buf = [0u8; SETTINGS_BLOB_SIZE + ITEM_OVERHEAD];
    match sequential_storage::map::store_item::<u8, &[u8], _>(
        flash,
        STORAGE_START..STORAGE_END,
        &mut NoCache::new(),
        &mut buf,
        &KEY_SETTINGS,
        &item,
    )
    .await
    {
        Ok(_) => {
            info!("Saved {} settings ({} bytes) to flash", store.len(), len);
            store.mark_clean();
        }
        Err(e) => {
            error!("Flash write error: {:?}", defmt::Debug2Format(&e));
        }
    }
}
