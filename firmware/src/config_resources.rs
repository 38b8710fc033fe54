// Controller GPIO pin mapping.

//
//| GPIO # | Name         | Description                                                   |
//| ------ | ------------ | ------------------------------------------------------------- |
//| 0      | CONSOLE_TX   | Debug console UART transmit.                                  |
//| 1      | CONSOLE_RX   | Debug console UART receive.                                   |
//| 2      | I2C1_SDA     | Host command bus data. AP is primary, the EC is secondary.    |
//| 3      | I2C1_SCL     | Host command bus clock.                                       |
//| 4      | PWR_BTN_IN   | Input from the physical power button. Active low.             |
//| 5      | LID_OPEN     | Lid switch input. High when the lid is open.                  |
//| 6      | SLP_S3_L     | Sleep S3 request from the AP. Active low.                     |
//| 7      | SLP_S4_L     | Sleep S4 request from the AP. Active low.                     |
//| 8      | PLT_RST_L    | AP platform reset indication. Active low.                     |
//| 9      | PGOOD_PP5000 | Power good from the 5 V bulk rail. Active high.               |
//| 10     | PGOOD_PP1050 | Power good from the 1.05 V suspend rail. Active high.         |
//| 11     | PGOOD_S5     | Power good from the always-on well. Active high.              |
//| 12     | PGOOD_VCORE  | Power good from the AP core rail. Active high.                |
//| 13     | SUSP_VR_EN   | Suspend voltage regulator enable. Active high.                |
//| 14     | PP1350_EN    | 1.35 V RAM rail enable. Active high.                          |
//| 15     | PP5000_EN    | 5 V bulk rail enable. Active high.                            |
//| 16     | PP3300_DX_EN | 3.3 V device-well rail enable. Active high.                   |
//| 17     | VCORE_EN     | AP core rail enable. Active high.                             |
//| 18     | SOC_RSMRST_L | Resume reset to the AP. Active low.                           |
//| 19     | SOC_SYS_PWROK| System power OK to the AP. Active high.                       |
//| 20     | SOC_CORE_PWROK| Core power OK to the AP. Active high.                        |
//| 21     | SOC_RCIN_L   | Warm reset input to the AP. Active low.                       |
//| 22     | CPU_PROCHOT  | CPU throttle request. Active high.                            |
//| 23     | TS_RST_L     | Touchscreen reset. Active low.                                |
//| 24     | TP_EN        | Touchpad power enable. Active high.                           |
//| 25     | STATUS_LED   | Power status LED. Active high.                                |
//| 26     | WLAN_EN      | Wireless module power enable. Active high.                    |
//| 27     | WLAN_SUSP_L  | Wireless module suspend. Active low.                          |
//| 28     | PWR_BTN_OUT  | Synthesized power button to the AP. Active low.               |

use assign_resources::assign_resources;
use embassy_rp::peripherals;

assign_resources! {
  console: ConsoleResources {
    uart: UART0,
    tx: PIN_0,
    rx: PIN_1,
  },
  host_i2c: HostI2cResources {
    sda: PIN_2,
    scl: PIN_3,
    i2c: I2C1,
  },
  power_button_input: PowerButtonInputResources {
    pin: PIN_4,
  },
  lid: LidInputResources {
    pin: PIN_5,
  },
  power_signals: PowerSignalResources {
    slp_s3_l: PIN_6,
    slp_s4_l: PIN_7,
    pgood_pp5000: PIN_9,
    pgood_pp1050: PIN_10,
    pgood_s5: PIN_11,
    pgood_vcore: PIN_12,
  },
  power_plane: PowerPlaneResources {
    plt_rst_l: PIN_8,
    susp_vr_en: PIN_13,
    pp1350_en: PIN_14,
    pp5000_en: PIN_15,
    pp3300_dx_en: PIN_16,
    vcore_en: PIN_17,
    soc_rsmrst_l: PIN_18,
    soc_sys_pwrok: PIN_19,
    soc_core_pwrok: PIN_20,
    soc_rcin_l: PIN_21,
    cpu_prochot: PIN_22,
    touchscreen_rst_l: PIN_23,
    touchpad_en: PIN_24,
    wlan_en: PIN_26,
    wlan_suspend_l: PIN_27,
  },
  status_led: StatusLedResources {
    pin: PIN_25,
  },
  power_button_output: PowerButtonOutputResources {
    pin: PIN_28,
  },
}
