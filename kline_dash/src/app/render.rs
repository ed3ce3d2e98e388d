use eframe::egui;
use egui::Color32;
use egui_plot::{GridMark, Line, Plot, PlotPoints};

use super::{format_clock_local, format_time_local, AppEvent, AppRuntime, UiEvent};
use crate::chart::CandleChart;
use crate::market::{Interval, Symbol};

const RISING: Color32 = Color32::from_rgb(38, 166, 154);
const FALLING: Color32 = Color32::from_rgb(239, 83, 80);

pub fn render(ctx: &egui::Context, rt: &mut AppRuntime) {
    let current = rt.state.selection;
    let mut symbol = current.symbol;
    let mut interval = current.interval;

    egui::TopBottomPanel::top("controls").show(ctx, |ui| {
        ui.vertical_centered(|ui| ui.heading("Binance Market Data"));
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            egui::ComboBox::from_label("Select Cryptocurrency")
                .selected_text(symbol.label())
                .show_ui(ui, |ui| {
                    for s in Symbol::ALL {
                        ui.selectable_value(&mut symbol, s, s.label());
                    }
                });
            ui.separator();
            egui::ComboBox::from_label("Select Interval")
                .selected_text(interval.label())
                .show_ui(ui, |ui| {
                    for iv in Interval::ALL {
                        ui.selectable_value(&mut interval, iv, iv.label());
                    }
                });
        });
        ui.add_space(4.0);
    });

    egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.label(rt.state.status_line());
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        if let Some(chart) = rt.chart() {
            draw_chart(ui, chart);
        }
    });

    if symbol != current.symbol {
        rt.handle_event(AppEvent::Ui(UiEvent::SymbolChanged { symbol }));
    }
    if interval != current.interval {
        rt.handle_event(AppEvent::Ui(UiEvent::IntervalChanged { interval }));
    }
}

fn draw_chart(ui: &mut egui::Ui, chart: &CandleChart) {
    ui.strong(&chart.label);
    if let Some(c) = chart.last() {
        ui.label(format!(
            "{}  O: {:.4}  H: {:.4}  L: {:.4}  C: {:.4}",
            format_time_local(chart.last_time_ms),
            c.open,
            c.high,
            c.low,
            c.close
        ));
    }
    ui.separator();

    Plot::new("candles_plot")
        .x_axis_label("Time")
        .y_axis_label("Price")
        // x is seconds; label ticks as local wall-clock time
        .x_axis_formatter(|mark: GridMark, _chars, _range| {
            format_clock_local((mark.value * 1000.0).round() as i64)
        })
        .include_y(chart.y_min)
        .include_y(chart.y_max)
        .show(ui, |plot_ui| {
            for c in &chart.candles {
                let color = if c.rising() { RISING } else { FALLING };

                let wick: PlotPoints = vec![[c.x, c.low], [c.x, c.high]].into();
                plot_ui.line(Line::new(wick).color(color));

                let body: PlotPoints = vec![[c.x, c.open], [c.x, c.close]].into();
                plot_ui.line(Line::new(body).color(color).width(4.0));
            }
        });
}
