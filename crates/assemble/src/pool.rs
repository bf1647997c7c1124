//! Canned content used to fill non-code sections with plausible firmware strings/filesystem
//! magic bytes rather than pure noise.

/// Realistic firmware log/string fragments, each NUL-terminated, used to fill string-table and
/// rodata sections.
pub const STRING_POOL: &[&[u8]] = &[
    b"Copyright (c) 2024 Firmware Corp. All rights reserved.\0",
    b"Build: release-v3.2.1-ga7f3c2d\0",
    b"ERROR: initialization failed\0",
    b"WARNING: low memory condition\0",
    b"firmware.bin\0",
    b"bootloader\0",
    b"kernel\0",
    b"rootfs\0",
    b"/dev/mtdblock0\0",
    b"/dev/ttyS0\0",
    b"eth0\0",
    b"wlan0\0",
    b"DHCP client started\0",
    b"Hardware revision: %d.%d\0",
    b"Serial: %08X%08X\0",
    b"Linux version 4.14.180\0",
    b"U-Boot 2019.07\0",
    b"Starting kernel ...\0",
    b"Booting from flash...\0",
    b"Image verified OK\0",
    b"CRC check passed\0",
    b"Decompressing...\0",
    b"Init complete.\0",
    b"GPIO initialized\0",
    b"SPI flash detected: W25Q128\0",
    b"DDR3 SDRAM: 128 MB\0",
    b"CPU: ARMv7 Processor rev 4 (v7l)\0",
    b"Machine: Generic DT based system\0",
];

/// Returns the magic bytes for a filesystem type name, or four zero bytes if unrecognized.
#[must_use]
pub fn fs_magic(fs_type: &str) -> &'static [u8] {
    match fs_type {
        "squashfs" => b"hsqs",
        "jffs2" => b"\x85\x19",
        "cramfs" => b"E=\xcd\x28",
        "romfs" => b"-rom1fs-",
        _ => b"\0\0\0\0",
    }
}
