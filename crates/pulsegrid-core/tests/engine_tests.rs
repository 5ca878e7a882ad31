use pulsegrid_core::{
    AnalyzerConfig, AntiStuckConfig, Engine, EngineConfig, GainMode, RhythmConfig, ShuffleConfig,
    ShuffleStyle, SpectrumAnalyzer, TickInput,
};

const DT: f32 = 1.0 / 60.0;

fn base_config(columns: usize, rows: usize) -> EngineConfig {
    EngineConfig {
        columns,
        rows,
        baseline_sensitivity: 0.0,
        shuffle: ShuffleConfig {
            enabled: false,
            ..Default::default()
        },
        rhythm: RhythmConfig {
            enabled: false,
            ..Default::default()
        },
        anti_stuck: AntiStuckConfig {
            enabled: false,
            ..Default::default()
        },
        shuffle_seed: Some(7),
        palette: pulsegrid_core::default_palette(columns),
        ..Default::default()
    }
}

fn tick(engine: &mut Engine, spectrum: &[f32], producing: bool) {
    engine.tick(TickInput {
        spectrum,
        waveform: None,
        is_producing_audio: producing,
        delta_time: DT,
    });
}

#[test]
fn test_silence_fallback_converges_to_dark() {
    let mut engine = Engine::new(base_config(8, 10)).unwrap();
    let loud = vec![0.8; 512];

    // Drive the grid up
    for _ in 0..120 {
        tick(&mut engine, &loud, true);
    }
    assert!(engine.column_height(0) > 1.0);

    // Two seconds of reported silence, regardless of the frame contents
    for _ in 0..120 {
        tick(&mut engine, &loud, false);
    }
    for c in 0..8 {
        assert!(
            engine.smoothed_intensity(c) < 1e-3,
            "column {} intensity stuck at {}",
            c,
            engine.smoothed_intensity(c)
        );
        assert!(engine.column_height(c) < 0.05);
        for r in 0..10 {
            assert!(engine.activation_level(c, r) < 0.05);
        }
    }
}

#[test]
fn test_auto_gain_keeps_activations_bounded() {
    let mut engine = Engine::new(base_config(16, 12)).unwrap();

    // Wildly varying loudness, including a huge surge
    for i in 0..600 {
        let level = match i % 3 {
            0 => 0.001,
            1 => 0.5,
            _ => 50.0,
        };
        let frame = vec![level; 512];
        tick(&mut engine, &frame, true);

        for c in 0..16 {
            for r in 0..12 {
                let a = engine.activation_level(c, r);
                assert!((0.0..=1.0).contains(&a), "activation out of range: {}", a);
            }
            let h = engine.column_height(c);
            assert!((0.0..=12.0).contains(&h), "height out of range: {}", h);
        }
        assert!(engine.max_observed_intensity() > 0.0);
    }
}

#[test]
fn test_beat_pulse_pops_then_relaxes() {
    let mut config = base_config(4, 10);
    config.gain = GainMode::Manual { gain: 1.0 };
    let mut engine = Engine::new(config).unwrap();

    // Columns read bins 0, 128, 256, 384; the beat band (60-120 Hz at
    // 44.1 kHz / 512 bins) reads bins 1..=2.
    let mut base = vec![0.0; 512];
    for bin in [0usize, 128, 256, 384] {
        base[bin] = 0.2;
    }
    base[1] = 0.5;
    base[2] = 0.5;

    for _ in 0..120 {
        tick(&mut engine, &base, true);
    }
    let steady = engine.column_height(0);
    assert!(steady > 1.0 && steady < 4.0, "steady height {}", steady);

    // One spiked frame in the beat band
    let mut spike = base.clone();
    spike[1] = 5.0;
    spike[2] = 5.0;
    tick(&mut engine, &spike, true);

    let mut peak: f32 = 0.0;
    for _ in 0..20 {
        tick(&mut engine, &base, true);
        peak = peak.max(engine.column_height(0));
    }
    assert!(
        peak > steady + 1.0,
        "pulse did not pop: steady {} peak {}",
        steady,
        peak
    );

    // Pulse over: the column settles back near its steady height
    for _ in 0..300 {
        tick(&mut engine, &base, true);
    }
    let settled = engine.column_height(0);
    assert!(
        (settled - steady).abs() < 0.3,
        "did not relax: steady {} settled {}",
        steady,
        settled
    );
}

#[test]
fn test_seeded_runs_are_identical() {
    let make = || {
        let mut config = base_config(12, 8);
        config.shuffle = ShuffleConfig {
            enabled: true,
            interval: 0.1,
            style: ShuffleStyle::Random,
        };
        config.shuffle_seed = Some(99);
        Engine::new(config).unwrap()
    };
    let mut a = make();
    let mut b = make();

    for i in 0..600 {
        // Deterministic pseudo-varying frame
        let frame: Vec<f32> = (0..512)
            .map(|bin| ((bin * 31 + i * 7) % 97) as f32 / 97.0)
            .collect();
        tick(&mut a, &frame, true);
        tick(&mut b, &frame, true);
    }

    assert_eq!(a.index_map(), b.index_map());
    for c in 0..12 {
        assert_eq!(a.column_height(c), b.column_height(c));
        assert_eq!(a.column_color(c), b.column_color(c));
    }
}

#[test]
fn test_rhythm_adaptation_stays_in_configured_bounds() {
    let mut config = base_config(8, 8);
    config.rhythm = RhythmConfig {
        enabled: true,
        ..Default::default()
    };
    config.shuffle.enabled = true;
    let mut engine = Engine::new(config).unwrap();

    // Alternate spiky and flat frames; nothing may escape the grid bounds
    for i in 0..600 {
        let frame: Vec<f32> = if i % 2 == 0 {
            (0..512).map(|b| if b % 8 == 0 { 1.0 } else { 0.0 }).collect()
        } else {
            vec![0.3; 512]
        };
        tick(&mut engine, &frame, true);
        for c in 0..8 {
            let h = engine.column_height(c);
            assert!((0.0..=8.0).contains(&h));
        }
        assert!(engine.index_map().is_permutation());
    }
}

#[test]
fn test_analyzer_feeds_engine_end_to_end() {
    let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default());
    let mut config = base_config(8, 8);
    config.spectrum_bins = analyzer.bins();
    let mut engine = Engine::new(config).unwrap();

    // 100 Hz tone through the analyzer into the engine
    let samples: Vec<f32> = (0..8192)
        .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 44100.0).sin() * 0.5)
        .collect();
    analyzer.process_samples(&samples);

    let frame = analyzer.latest_frame().clone();
    assert!(!frame.magnitudes.is_empty());

    for _ in 0..60 {
        engine.tick(TickInput {
            spectrum: &frame.magnitudes,
            waveform: Some(&frame.waveform),
            is_producing_audio: true,
            delta_time: DT,
        });
    }

    // Low-frequency energy must light the column mapped to the lowest bins
    assert!(engine.column_height(0) > 0.5);
}
