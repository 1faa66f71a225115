//! Per-platform selection rules for the viewer package.
//!
//! These are DATA. Each platform composes the shared tree with its own
//! additions; conditions (build configuration, channel) are ordinary `if`s
//! while the tree is being built, never inside the evaluator.

use super::RuleTree;
use crate::channel::Channel;
use crate::config::Platform;

/// Build inputs the rule trees depend on.
#[derive(Debug, Clone, Copy)]
pub struct RuleSettings<'a> {
    /// Build configuration directory name (`Release`, `Debug`, ...).
    pub configuration: &'a str,
    pub channel: &'a Channel,
}

impl RuleSettings<'_> {
    fn debug(&self) -> bool {
        self.configuration.eq_ignore_ascii_case("debug")
    }

    fn app_lower(&self) -> String {
        self.channel
            .app_name
            .split_whitespace()
            .collect::<String>()
            .to_lowercase()
    }

    fn app_oneword(&self) -> String {
        self.channel.app_name.split_whitespace().collect()
    }
}

/// The complete rule tree for `platform`.
pub fn rules_for(platform: Platform, settings: &RuleSettings<'_>) -> RuleTree {
    match platform {
        Platform::Windows => windows(settings),
        Platform::Darwin => darwin(settings),
        Platform::LinuxI686 => linux_i686(settings),
        Platform::LinuxX86_64 => linux_x86_64(settings),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared
// ─────────────────────────────────────────────────────────────────────────────

/// Files every platform ships: settings, character data, fonts, skins.
pub fn shared() -> RuleTree {
    let mut t = RuleTree::new();
    t.exclude("*.svn*");
    t.select_to(
        "../../scripts/messages/message_template.msg",
        "app_settings/message_template.msg",
    );
    t.select_to("../../etc/message.xml", "app_settings/message.xml");

    t.prefix_same("app_settings", |t| {
        t.exclude("logcontrol.xml");
        t.exclude("logcontrol-dev.xml");
        t.select("*.pem");
        t.select("*.ini");
        t.select("*.xml");
        t.optional("*.db2");
        t.select("shaders");
        t.select("windlight");

        // Spell-check dictionaries come from the third-party package tree.
        t.prefix("../../packages", "", |t| {
            t.optional("dictionaries");
        });
    });

    t.prefix_same("character", |t| {
        t.select("*.llm");
        t.select("*.xml");
        t.select("*.tga");
    });

    t.prefix_same("fonts", |t| {
        t.select("*.ttf");
        t.optional("*.txt");
    });

    t.prefix_same("skins", |t| {
        t.select("paths.xml");
        t.prefix_same("*/textures", |t| {
            for ext in ["tga", "j2c", "jpg", "png"] {
                t.optional(&format!("*/*.{}", ext));
                t.optional(&format!("*.{}", ext));
            }
            t.select("textures.xml");
        });
        t.select("*/xui/*/*.xml");
        t.optional("*/xui/*/widgets/*.xml");
        t.select("*/*.xml");
        t.prefix_same("*/html", |t| {
            t.optional("*.png");
            t.optional("*/*/*.html");
            t.optional("*/*/*.gif");
        });
    });

    t.prefix_same("local_assets", |t| {
        t.optional("*.j2c");
        t.optional("*.tga");
    });

    t.select("gpu_table.txt");

    // Only present for scripted builds.
    t.optional_to("../../summary.json", "summary.json");
    t
}

// ─────────────────────────────────────────────────────────────────────────────
// Windows
// ─────────────────────────────────────────────────────────────────────────────

fn windows(s: &RuleSettings<'_>) -> RuleTree {
    let config = s.configuration;
    let mut t = shared();

    t.select_to(
        &format!("{}/{}-bin.exe", config, s.app_lower()),
        &s.channel.final_exe(),
    );
    t.select_to(
        &format!("../llplugin/slplugin/{}/slplugin.exe", config),
        "slplugin.exe",
    );
    t.select_to(
        "../viewer_components/updater/scripts/windows/update_install.bat",
        "update_install.bat",
    );

    t.prefix(&format!("../sharedlibs/{}", config), "", |t| {
        // llcommon and its deps are absent when linked statically.
        for dll in ["llcommon.dll", "libapr-1.dll", "libaprutil-1.dll", "libapriconv-1.dll"] {
            t.optional(dll);
        }

        if s.debug() {
            t.select("libcollada14dom22-d.dll");
            t.select("openjpegd.dll");
            t.optional("msvcr100d.dll");
            t.optional("msvcp100d.dll");
        } else {
            t.select("libcollada14dom22.dll");
            t.select("openjpeg.dll");
            t.optional("msvcr100.dll");
            t.optional("msvcp100.dll");
        }
        t.select("glod.dll");
        t.optional("fmod.dll");

        // Vivox voice runtime.
        for file in [
            "SLVoice.exe",
            "vivoxsdk.dll",
            "ortp.dll",
            "libsndfile-1.dll",
            "vivoxoal.dll",
            "vivoxplatform.dll",
        ] {
            t.select(file);
        }

        for dll in ["ssleay32.dll", "libeay32.dll", "libhunspell.dll", "openal32.dll", "alut.dll"] {
            t.select(dll);
        }
        t.optional("zlib1.dll");

        if s.debug() {
            t.optional("libtcmalloc_minimal-debug.dll");
        } else {
            t.optional("libtcmalloc_minimal.dll");
        }

        t.select_to("licenses-win32.txt", "licenses.txt");
        t.select("featuretable.txt");
        t.select("featuretable_xp.txt");
    });

    t.prefix(&format!("../media_plugins/gstreamer010/{}", config), "llplugin", |t| {
        t.optional("media_plugin_gstreamer010.dll");
    });
    t.prefix("../packages/lib/release/gstreamer-plugins", "llplugin/gstreamer-plugins", |t| {
        t.optional("libgst*.dll");
    });
    t.prefix(&format!("../media_plugins/quicktime/{}", config), "llplugin", |t| {
        t.optional("media_plugin_quicktime.dll");
    });
    t.prefix(&format!("../media_plugins/webkit/{}", config), "llplugin", |t| {
        t.optional("media_plugin_webkit.dll");
    });
    t.prefix(&format!("../media_plugins/winmmshim/{}", config), "", |t| {
        t.optional("winmm.dll");
    });

    // Qt runtime for the web plugin.
    let (qt_dir, suffix) = if s.debug() {
        ("../packages/lib/debug", "d4")
    } else {
        ("../packages/lib/release", "4")
    };
    t.prefix(qt_dir, "llplugin", |t| {
        t.select("libeay32.dll");
        t.select("ssleay32.dll");
        for lib in ["qtcore", "qtgui", "qtnetwork", "qtopengl", "qtwebkit", "qtxmlpatterns"] {
            t.select(&format!("{}{}.dll", lib, suffix));
        }
        t.prefix_same("imageformats", |t| {
            for fmt in ["qgif", "qico", "qjpeg", "qmng", "qsvg", "qtiff"] {
                t.select(&format!("{}{}.dll", fmt, suffix));
            }
        });
        t.prefix_same("codecs", |t| {
            for codec in ["qcncodecs", "qjpcodecs", "qkrcodecs", "qtwcodecs"] {
                t.select(&format!("{}{}.dll", codec, suffix));
            }
        });
    });

    t.select_to(
        &format!("../win_crash_logger/{}/windows-crash-logger.exe", config),
        "win_crash_logger.exe",
    );
    t.select_to(
        &format!("../win_updater/{}/windows-updater.exe", config),
        "updater.exe",
    );
    t
}

// ─────────────────────────────────────────────────────────────────────────────
// Darwin
// ─────────────────────────────────────────────────────────────────────────────

fn darwin(s: &RuleSettings<'_>) -> RuleTree {
    let config = s.configuration;
    let app = s.app_oneword();
    let mut t = RuleTree::new();

    // The linked bundle is the skeleton; everything else lands inside it.
    t.select_to(&format!("{}/{}.app", config, app), "");

    t.prefix("", "Contents", |t| {
        t.prefix("../../libraries/universal-darwin/lib_release", "MacOS", |t| {
            for lib in [
                "libndofdev.dylib",
                "libalut.0.dylib",
                "libopenal.1.dylib",
                "libopenjpeg.1.4.dylib",
            ] {
                t.select(lib);
            }
        });

        t.select_to(
            "../packages/lib/release/libndofdev.dylib",
            "Resources/libndofdev.dylib",
        );
        t.select_to(
            "../packages/lib/release/libhunspell-1.3.0.dylib",
            "Resources/libhunspell-1.3.0.dylib",
        );
        t.select_to(
            "../viewer_components/updater/scripts/darwin/update_install",
            "MacOS/update_install",
        );
        t.select_to("packaging/mac/Info.plist", "Info.plist");

        t.prefix("", "Resources", |t| {
            t.extend(shared());

            t.prefix_same("cursors_mac", |t| {
                t.select("*.tif");
            });
            t.select_to("licenses-mac.txt", "licenses.txt");
            t.select("featuretable_mac.txt");
            t.select("viewer.icns");

            t.prefix("packaging/mac", "", |t| {
                t.select(&format!("{}.nib", app));
                for lang in [
                    "English", "German", "Japanese", "Korean", "da", "es", "fr", "hu", "it",
                    "nl", "pl", "pt", "ru", "tr", "uk", "zh-Hans",
                ] {
                    t.select(&format!("{}.lproj", lang));
                }
            });

            t.prefix("../packages/lib/release", "", |t| {
                t.optional("libllcommon.dylib");
                for lib in [
                    "libapr-1.0.dylib",
                    "libaprutil-1.0.dylib",
                    "libexpat.1.5.2.dylib",
                    "libexception_handler.dylib",
                    "libGLOD.dylib",
                    "libcollada14dom.dylib",
                    "libsndfile.dylib",
                    "libvivoxoal.dylib",
                    "libortp.dylib",
                    "libvivoxsdk.dylib",
                    "libvivoxplatform.dylib",
                    "SLVoice",
                ] {
                    t.select(lib);
                }
            });

            t.optional_to(
                &format!("{}/libfmodwrapper.dylib", config),
                "libfmodwrapper.dylib",
            );

            t.select_to(
                &format!("../mac_crash_logger/{}/mac-crash-logger.app", config),
                "mac-crash-logger.app",
            );
            t.select_to(
                &format!("../mac_updater/{}/mac-updater.app", config),
                "mac-updater.app",
            );
            t.select_to(
                &format!("../llplugin/slplugin/{}/SLPlugin.app", config),
                "SLPlugin.app",
            );

            t.prefix("", "llplugin", |t| {
                t.select_to(
                    &format!("../media_plugins/webkit/{}/media_plugin_webkit.dylib", config),
                    "media_plugin_webkit.dylib",
                );
                t.select_to(
                    "../packages/lib/release/libllqtwebkit.dylib",
                    "libllqtwebkit.dylib",
                );
            });

            // Launch arguments selecting the grid and channel.
            t.write_file("arguments.txt", &s.channel.flags());
        });
    });
    t
}

// ─────────────────────────────────────────────────────────────────────────────
// Linux
// ─────────────────────────────────────────────────────────────────────────────

fn linux(s: &RuleSettings<'_>) -> RuleTree {
    let app = s.app_lower();
    let mut t = shared();

    t.select_to("licenses-linux.txt", "licenses.txt");
    t.select_to(&format!("res/{}_icon.png", app), &format!("{}_icon.png", app));

    t.prefix("linux_tools", "", |t| {
        t.select_to("client-readme.txt", "README-linux.txt");
        t.select_to("client-readme-voice.txt", "README-linux-voice.txt");
        t.select_to("client-readme-joystick.txt", "README-linux-joystick.txt");
        t.select_to("wrapper.sh", &app);
        for script in [
            "handle_secondlifeprotocol.sh",
            "register_secondlifeprotocol.sh",
            "register_hopprotocol.sh",
            "refresh_desktop_app_entry.sh",
            "launch_url.sh",
        ] {
            t.select_to(script, &format!("etc/{}", script));
        }
        t.select("install.sh");
    });

    // Grid the package is built for.
    t.write_file("etc/gridargs.dat", &s.channel.flags());

    t.select_to(
        &format!("{}-bin", app),
        &format!("bin/do-not-directly-run-{}-bin", app),
    );
    t.select_to("../linux_crash_logger/linux-crash-logger", "bin/linux-crash-logger.bin");
    t.select_to("../linux_updater/linux-updater", "bin/linux-updater.bin");
    t.select_to("../llplugin/slplugin/SLPlugin", "bin/SLPlugin");

    t.prefix_same("res-sdl", |t| {
        t.select("*");
    });

    let icons = s.channel.icon_path();
    t.prefix(&icons, "", |t| {
        t.select(&format!("{}_icon.png", app));
        t.prefix("", "res-sdl", |t| {
            t.select(&format!("{}_icon.BMP", app));
        });
    });

    t.select_to(
        "../viewer_components/updater/scripts/linux/update_install",
        "bin/update_install",
    );

    t.prefix("", "bin/llplugin", |t| {
        t.select_to(
            "../media_plugins/webkit/libmedia_plugin_webkit.so",
            "libmedia_plugin_webkit.so",
        );
        t.select_to(
            "../media_plugins/gstreamer010/libmedia_plugin_gstreamer010.so",
            "libmedia_plugin_gstreamer.so",
        );
    });

    t.select("featuretable_linux.txt");
    t
}

fn linux_i686(s: &RuleSettings<'_>) -> RuleTree {
    let mut t = linux(s);

    t.optional_to("../llkdu/libllkdu.so", "bin/libllkdu.so");
    t.optional_to("../llcommon/libllcommon.so", "lib/libllcommon.so");

    t.prefix("../packages/lib/release", "lib", |t| {
        for lib in [
            "libapr-1.so*",
            "libaprutil-1.so*",
            "libbreakpad_client.so*",
            "libcollada14dom.so",
            "libdb*.so",
            "libcrypto.so.*",
            "libexpat.so.*",
            "libssl.so",
            "libssl.so.1.0.0",
            "libglod.so",
            "libminizip.so",
            "libuuid.so*",
            "libSDL-1.2.so.*",
            "libopenjpeg.so*",
            "libhunspell-1.3.so*",
            "libalut.so*",
            "libopenal.so*",
            "libfontconfig.so*",
            "libpng15.so.15*",
        ] {
            t.select(lib);
        }
        // Vivox expects this soname.
        t.select_to("libopenal.so", "libvivoxoal.so.1");
        t.optional("libdirectfb-1.*.so.*");
        t.optional("libfusion-1.*.so.*");
        t.optional("libdirect-1.*.so.*");
        t.optional("libtcmalloc.so*");
    });

    t.prefix("../packages/lib/release", "bin", |t| {
        t.select("SLVoice");
    });
    t.prefix("../packages/lib/release", "lib", |t| {
        for lib in ["libortp.so", "libsndfile.so.1", "libvivoxsdk.so", "libvivoxplatform.so"] {
            t.select(lib);
        }
    });
    t
}

fn linux_x86_64(s: &RuleSettings<'_>) -> RuleTree {
    let mut t = linux(s);

    t.select("secondlife-i686.supp");
    t.optional_to("../llcommon/libllcommon.so", "lib64/libllcommon.so");

    t.prefix("../packages/lib/release", "lib64", |t| {
        for lib in [
            "libapr-1.so*",
            "libaprutil-1.so*",
            "libbreakpad_client.so*",
            "libdb*.so",
            "libcrypto.so.1.0.0",
            "libssl.so*",
            "libexpat.so.1",
            "libjpeg.so*",
            "libopenjpeg.so*",
            "libhunspell-1.3.so*",
            "libpcre*.so*",
            "libminizip.so*",
            "libxml2.so.2.7.8",
            "libz.so*",
            "libcollada14dom.so*",
            "libglod.so",
            "libalut.so*",
            "libopenal.so*",
            "libfontconfig.so*",
            "libpng15.so.15*",
        ] {
            t.select(lib);
        }
        t.select_to("libcares.so.2.0.0", "libcares.so.2");
        t.select_to("libcurl.so.4.2.0", "libcurl.so.4");
        t.select_to("libSDL-1.2.so.0.11.3", "libSDL-1.2.so.0");
    });

    t.prefix("../packages/lib/release/vivox-runtime", "bin", |t| {
        t.select("SLVoice");
    });
    t.prefix("../packages/lib/release/vivox-runtime", "lib32", |t| {
        t.select("libortp.so");
        t.select("libvivoxsdk.so");
    });

    // 32-bit libraries the voice client needs.
    t.prefix("../packages/lib/release/32bit-compat", "lib32", |t| {
        for lib in ["libalut.so*", "libidn.so*", "libopenal.so*", "libuuid.so*"] {
            t.select(lib);
        }
    });
    t
}
