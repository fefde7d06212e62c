pub(super) const VIDEO_ID: &str = "lesson-video";
pub(super) const FRAME_ID: &str = "lesson-player-frame";
pub(super) const VIEWER_ID: &str = "lesson-viewer";

const HLS_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/hls.js@1";

/// Installs `window.__coursePlayer` and keeps the eval channel open so media
/// events can be posted back to Rust.
pub(super) fn player_bridge_script() -> String {
    format!(
        r#"
        const videoId = {VIDEO_ID:?};
        const frameId = {FRAME_ID:?};
        const hlsSrc = {HLS_SCRIPT_URL:?};
        const player = window.__coursePlayer || (window.__coursePlayer = {{
            session: null,
            video: null,
            hls: null,
            hlsLoading: null,
            hlsLoadFailed: false,
            onHidden: null,
            listeners: [],
        }});

        player.emit = function(session, event, value, detail) {{
            dioxus.send({{
                session: session,
                event: event,
                value: (typeof value === "number" && isFinite(value)) ? value : null,
                detail: detail == null ? null : String(detail),
            }});
        }};

        player.loadHls = function() {{
            if (window.Hls) {{
                return Promise.resolve(window.Hls);
            }}
            if (!player.hlsLoading) {{
                player.hlsLoading = new Promise(function(resolve) {{
                    const tag = document.createElement("script");
                    tag.src = hlsSrc;
                    tag.onload = function() {{
                        player.hlsLoadFailed = false;
                        resolve(window.Hls || null);
                    }};
                    tag.onerror = function() {{
                        player.hlsLoading = null;
                        player.hlsLoadFailed = true;
                        resolve(null);
                    }};
                    document.head.appendChild(tag);
                }});
            }}
            return player.hlsLoading;
        }};

        player.withVideo = function(session, run) {{
            let frames = 0;
            const attempt = function() {{
                if (player.session !== session) {{
                    return;
                }}
                const video = document.getElementById(videoId);
                if (video) {{
                    run(video);
                }} else if (frames++ < 120) {{
                    requestAnimationFrame(attempt);
                }}
            }};
            attempt();
        }};

        if (player.onHidden) {{
            document.removeEventListener("visibilitychange", player.onHidden);
        }}
        player.onHidden = function() {{
            if (document.hidden && player.session !== null) {{
                player.emit(player.session, "hidden");
            }}
        }};
        document.addEventListener("visibilitychange", player.onHidden);

        player.listen = function(target, name, handler) {{
            target.addEventListener(name, handler);
            player.listeners.push(function() {{ target.removeEventListener(name, handler); }});
        }};

        player.bindVideo = function(session, video) {{
            const emit = function(event, value, detail) {{
                if (player.session === session) {{
                    player.emit(session, event, value, detail);
                }}
            }};
            const codes = {{
                1: "MEDIA_ERR_ABORTED",
                2: "MEDIA_ERR_NETWORK",
                3: "MEDIA_ERR_DECODE",
                4: "MEDIA_ERR_SRC_NOT_SUPPORTED",
            }};
            player.listen(video, "canplay", function() {{ emit("canplay"); }});
            player.listen(video, "loadedmetadata", function() {{ emit("loadedmetadata", video.duration); }});
            player.listen(video, "durationchange", function() {{ emit("durationchange", video.duration); }});
            player.listen(video, "timeupdate", function() {{ emit("timeupdate", video.currentTime); }});
            player.listen(video, "playing", function() {{ emit("playing"); }});
            player.listen(video, "pause", function() {{ emit("pause"); }});
            player.listen(video, "volumechange", function() {{ emit("volumechange", video.volume); }});
            player.listen(video, "error", function() {{
                const code = video.error ? video.error.code : 0;
                emit("error", null, codes[code] || "MEDIA_ERR_UNKNOWN");
            }});
            player.listen(document, "fullscreenchange", function() {{
                emit("fullscreenchange", document.fullscreenElement ? 1 : 0);
            }});
        }};

        player.attach = function(session, url, isHls) {{
            player.teardown();
            player.session = session;
            player.withVideo(session, function(video) {{
                player.video = video;
                player.bindVideo(session, video);
                if (!isHls) {{
                    video.src = url;
                    video.load();
                    return;
                }}
                player.loadHls().then(function(Hls) {{
                    if (player.session !== session) {{
                        return;
                    }}
                    if (Hls && Hls.isSupported()) {{
                        const hls = new Hls();
                        player.hls = hls;
                        hls.on(Hls.Events.MANIFEST_PARSED, function() {{
                            if (player.session === session) {{
                                player.emit(session, "manifestparsed");
                            }}
                        }});
                        hls.on(Hls.Events.ERROR, function(_event, data) {{
                            if (data && data.fatal && player.session === session) {{
                                player.emit(session, "error", null, data.type);
                            }}
                        }});
                        hls.loadSource(url);
                        hls.attachMedia(video);
                    }} else if (video.canPlayType("application/vnd.apple.mpegurl")) {{
                        video.src = url;
                        video.load();
                    }} else if (!Hls && player.hlsLoadFailed) {{
                        // The hls.js download failed, so a retry may still work.
                        player.emit(session, "error", null, "networkError");
                    }} else {{
                        player.emit(session, "error", null, "unsupported");
                    }}
                }});
            }});
        }};

        player.teardown = function() {{
            player.session = null;
            player.listeners.forEach(function(off) {{ off(); }});
            player.listeners = [];
            if (player.hls) {{
                player.hls.destroy();
                player.hls = null;
            }}
            const video = player.video || document.getElementById(videoId);
            if (video) {{
                video.pause();
                video.removeAttribute("src");
                video.load();
            }}
            player.video = null;
            if (document.fullscreenElement) {{
                document.exitFullscreen().catch(function() {{}});
            }}
        }};

        player.play = function() {{
            if (player.video) {{
                const pending = player.video.play();
                if (pending && pending.catch) {{
                    pending.catch(function() {{}});
                }}
            }}
        }};
        player.pause = function() {{
            if (player.video) {{
                player.video.pause();
            }}
        }};
        player.seek = function(to) {{
            const video = player.video;
            if (!video) {{
                return;
            }}
            const end = isFinite(video.duration) ? video.duration : to;
            video.currentTime = Math.max(0, Math.min(to, end));
        }};
        player.enterFullscreen = function() {{
            const frame = document.getElementById(frameId);
            if (frame && frame.requestFullscreen) {{
                frame.requestFullscreen().catch(function() {{}});
            }}
        }};
        player.exitFullscreen = function() {{
            if (document.fullscreenElement) {{
                document.exitFullscreen().catch(function() {{}});
            }}
        }};

        await new Promise(function() {{}});
        "#
    )
}

pub(super) fn attach_script(session: u64, url: &str, is_hls: bool) -> String {
    format!("window.__coursePlayer && window.__coursePlayer.attach({session}, {url:?}, {is_hls});")
}

pub(super) fn seek_script(to_secs: f64) -> String {
    let to = if to_secs.is_finite() { to_secs.max(0.0) } else { 0.0 };
    format!("window.__coursePlayer && window.__coursePlayer.seek({to});")
}

/// One of the argument-less player methods.
pub(super) fn call_script(method: &str) -> String {
    format!("window.__coursePlayer && window.__coursePlayer.{method}();")
}

pub(super) fn focus_viewer_script() -> String {
    format!("document.getElementById({VIEWER_ID:?})?.focus();")
}
