pub mod fake_ytdlp;
