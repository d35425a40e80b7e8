use pslaunch_core::stage::ResourceTable;

/// The resource table this build carries. Populated by `build.rs` when the
/// packaging step supplied `PSLAUNCH_PAYLOAD`; empty otherwise.
pub fn resource_table() -> ResourceTable {
    #[cfg(embedded_payload)]
    {
        use pslaunch_core::stage::EmbeddedResource;
        static ENTRIES: [EmbeddedResource; 1] = [EmbeddedResource {
            name: env!("PSLAUNCH_PAYLOAD_NAME"),
            bytes: include_bytes!(env!("PSLAUNCH_PAYLOAD_FILE")),
        }];
        ResourceTable::new(&ENTRIES)
    }
    #[cfg(not(embedded_payload))]
    {
        ResourceTable::new(&[])
    }
}
