//! Rendering of prompts and forecasts as Block Kit messages.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use weather_core::ForecastView;

use crate::slack::blocks::{
    Accessory, Block, InputBlock, InputElement, Message, SectionBlock, TextObject,
};

pub const CITY_ACTION_ID: &str = "pick_a_city";
pub const CITY_NOT_FOUND: &str = "Sorry, I can't find that city. Please try again.";
pub const GENERIC_ERROR: &str = "Sorry, an error has occured. Please try again later.";
const FORECAST_FALLBACK: &str = "Here is your weather forcast.";

/// Panel asking `user` to type a city name.
pub fn city_prompt(user: &str) -> Message {
    let greeting = format!(
        "Hi <@{user}>. I can check the weather for you. Please type a city name in the input field below."
    );

    Message::with_blocks(
        greeting.clone(),
        vec![Block::Input(InputBlock {
            dispatch_action: true,
            element: InputElement::PlainTextInput {
                action_id: CITY_ACTION_ID.to_string(),
                placeholder: TextObject::plain("Enter your city here"),
            },
            label: TextObject::PlainText { text: greeting, emoji: Some(false) },
        })],
    )
}

/// Forecast message for `view`, with the update time shown in `tz`.
pub fn forecast_message<Tz>(view: &ForecastView, tz: &Tz) -> Message
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let updated: DateTime<Tz> = view.last_updated.with_timezone(tz);
    let day = updated.format("%B %-d");
    let time = updated.format("%-I:%M %p");

    let header = Block::Section(SectionBlock {
        text: Some(TextObject::mrkdwn(format!(
            "Here is your weather forcast for {}, {} on {day} as of {time}",
            view.city, view.country
        ))),
        ..Default::default()
    });

    let current = Block::Section(SectionBlock {
        block_id: Some("currentWeather".to_string()),
        text: Some(TextObject::mrkdwn(format!(
            "Current conditions:\n\
             {}\n\
             Temperature: {} °C\n\
             Feels like: {} °C\n\
             Humidity: {} %\n\
             Barometric Pressure: {} mbar \n\
             Wind: {} km/h {}\n",
            view.condition,
            view.temp_c,
            view.feels_like_c,
            view.humidity_pct,
            view.pressure_mb,
            view.wind_kph,
            view.wind_dir,
        ))),
        accessory: Some(Accessory::Image {
            image_url: view.icon_url.clone(),
            alt_text: format!("Current weather condition is {}", view.condition),
        }),
        ..Default::default()
    });

    let today = Block::Section(SectionBlock {
        block_id: Some("forecast".to_string()),
        fields: vec![TextObject::mrkdwn(format!(
            "Today:\n\
             Day time max: {} °C\n\
             Day time low: {} °C\n\
             Average temperature: {} °C\n\
             Probability of Precipitation: {} %\n\
             Sunrise: {}\n\
             Sunset: {}",
            view.max_temp_c,
            view.min_temp_c,
            view.avg_temp_c,
            view.chance_of_rain_pct,
            clean_sun_time(&view.sunrise),
            clean_sun_time(&view.sunset),
        ))],
        ..Default::default()
    });

    Message::with_blocks(FORECAST_FALLBACK, vec![header, current, Block::Divider, today])
}

/// `06:05 AM` -> `6:05 a.m.`
pub fn clean_sun_time(raw: &str) -> String {
    raw.trim_start_matches('0').replacen("AM", "a.m.", 1).replacen("PM", "p.m.", 1)
}
